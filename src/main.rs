//! Satchel debug tool
//!
//! Inspection and demo utility for item-backed pack inventories.
//!
//! Usage:
//!   satchel new <file> [--item <key>]
//!   satchel show <file>
//!   satchel validate <file>
//!   satchel demo

use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use tracing::info;

use satchel_core::{ItemKey, ItemRegistry, ItemStack};
use satchel_inventory::{
    PackInventory, PackSession, PackViewFactory, PlayerInventory, ViewRegistry, CONTENTS_KEY,
    MAIN_SIZE,
};

mod config;

use config::{load_item_registry, SatchelConfig};

#[derive(Debug)]
struct CliOptions {
    command: Command,
    config_path: PathBuf,
    items_path: Option<PathBuf>,
}

#[derive(Debug)]
enum Command {
    New { file: PathBuf, item: String },
    Show { file: PathBuf },
    Validate { file: PathBuf },
    Demo,
    Help,
}

fn main() -> Result<()> {
    // WARN by default; override via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let options = parse_args(env::args().skip(1))?;
    let cfg = SatchelConfig::load_from_path(&options.config_path);
    let items_path = options
        .items_path
        .unwrap_or_else(|| PathBuf::from(&cfg.items_path));
    let registry = load_item_registry(&items_path);
    info!(items = registry.len(), "item registry loaded");

    match options.command {
        Command::New { file, item } => cmd_new(&cfg, &registry, &file, &item),
        Command::Show { file } => cmd_show(&cfg, &registry, &file),
        Command::Validate { file } => cmd_validate(&cfg, &registry, &file),
        Command::Demo => cmd_demo(&cfg, registry),
        Command::Help => {
            print_help();
            Ok(())
        }
    }
}

fn parse_args<I>(mut args: I) -> Result<CliOptions>
where
    I: Iterator<Item = String>,
{
    let mut command_name: Option<String> = None;
    let mut positional: Vec<String> = Vec::new();
    let mut config_path = PathBuf::from("config/satchel.toml");
    let mut items_path: Option<PathBuf> = None;
    let mut item = "satchel:rucksack".to_string();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config_path = args
                    .next()
                    .map(PathBuf::from)
                    .context("--config requires a path")?;
            }
            "--items" => {
                items_path = Some(
                    args.next()
                        .map(PathBuf::from)
                        .context("--items requires a path")?,
                );
            }
            "--item" => {
                item = args.next().context("--item requires an item key")?;
            }
            "--help" | "-h" => {
                command_name = Some("help".to_string());
            }
            _ if command_name.is_none() => command_name = Some(arg),
            _ => positional.push(arg),
        }
    }

    let command = match command_name.as_deref() {
        Some("new") => Command::New {
            file: take_file(&mut positional, "new")?,
            item,
        },
        Some("show") => Command::Show {
            file: take_file(&mut positional, "show")?,
        },
        Some("validate") => Command::Validate {
            file: take_file(&mut positional, "validate")?,
        },
        Some("demo") => Command::Demo,
        Some("help") | None => Command::Help,
        Some(other) => bail!("unknown command `{other}` (try `satchel help`)"),
    };

    Ok(CliOptions {
        command,
        config_path,
        items_path,
    })
}

fn take_file(positional: &mut Vec<String>, command: &str) -> Result<PathBuf> {
    if positional.is_empty() {
        bail!("`satchel {command}` requires a file argument");
    }
    Ok(PathBuf::from(positional.remove(0)))
}

fn print_help() {
    println!("satchel - item-backed pack inventory tool");
    println!();
    println!("Commands:");
    println!("  new <file> [--item <key>]   create a fresh pack item file");
    println!("  show <file>                 print the pack's contents");
    println!("  validate <file>             report malformed slot records");
    println!("  demo                        scripted shift-click walkthrough");
    println!();
    println!("Options:");
    println!("  --config <path>   config file (default: config/satchel.toml)");
    println!("  --items <path>    item definitions (overrides config)");
}

fn read_stack(path: &Path) -> Result<ItemStack> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

fn write_stack(path: &Path, stack: &ItemStack) -> Result<()> {
    let text = serde_json::to_string_pretty(stack)?;
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn cmd_new(cfg: &SatchelConfig, registry: &ItemRegistry, file: &Path, item: &str) -> Result<()> {
    let key = ItemKey::parse(item).with_context(|| format!("invalid item key `{item}`"))?;
    let id = registry
        .id_for(&key)
        .with_context(|| format!("item `{key}` is not defined"))?;

    let pack = PackInventory::open(ItemStack::new(id, 1), registry, &cfg.pack_config())
        .with_context(|| format!("cannot open a pack on `{key}`"))?;
    let owner = pack.into_owner();
    write_stack(file, &owner)?;
    println!("created {} ({key})", file.display());
    Ok(())
}

fn cmd_show(cfg: &SatchelConfig, registry: &ItemRegistry, file: &Path) -> Result<()> {
    let owner = read_stack(file)?;
    let pack = PackInventory::open(owner, registry, &cfg.pack_config())?;

    println!("pack: {}", file.display());
    println!("instance: {}", pack.instance_id());
    println!("slots: {} (stack limit {})", pack.len(), pack.stack_limit());
    for (slot, stack) in pack.slots().iter().enumerate() {
        match stack {
            Some(stack) => {
                let name = registry
                    .get(stack.id)
                    .map(|def| def.display_name.clone())
                    .unwrap_or_else(|| format!("#{}", stack.id));
                println!("  [{slot}] {name} x{}", stack.count);
            }
            None => println!("  [{slot}] -"),
        }
    }
    Ok(())
}

fn cmd_validate(cfg: &SatchelConfig, registry: &ItemRegistry, file: &Path) -> Result<()> {
    let owner = read_stack(file)?;
    let stored = owner
        .tag
        .as_ref()
        .and_then(|tag| tag.get(CONTENTS_KEY))
        .and_then(|contents| contents.as_array())
        .map(|records| records.len())
        .unwrap_or(0);

    let pack = PackInventory::open(owner, registry, &cfg.pack_config())?;
    let kept = pack.slots().iter().flatten().count();
    let dropped = stored.saturating_sub(kept);

    println!("{}: {stored} stored, {kept} kept, {dropped} dropped", file.display());
    if dropped > 0 {
        println!("run `satchel show` after re-saving to normalize the file");
    }
    Ok(())
}

fn cmd_demo(cfg: &SatchelConfig, registry: ItemRegistry) -> Result<()> {
    let registry = Arc::new(registry);
    let pack_config = cfg.pack_config();

    let mut views = ViewRegistry::new();
    let pack_view = views.register(Box::new(PackViewFactory::new(pack_config)));

    let rucksack = registry
        .id_for(&ItemKey::parse("satchel:rucksack").expect("literal key"))
        .context("demo needs a `satchel:rucksack` item definition")?;
    let stone = registry
        .id_for(&ItemKey::parse("satchel:stone").expect("literal key"))
        .context("demo needs a `satchel:stone` item definition")?;

    let mut player = PlayerInventory::new();
    player.set(MAIN_SIZE, Some(ItemStack::new(rucksack, 1)));
    player.set(0, Some(ItemStack::new(stone, 40)));
    player.set(1, Some(ItemStack::new(stone, 30)));

    println!("opening pack view {} on the equipped rucksack", pack_view.raw());
    let mut session = views.open(pack_view, player, registry)?;

    let main_start = session.pack().len();
    println!("shift-click main slot 0 (40 stone) -> pack");
    report(session.shift_click(main_start));
    println!("shift-click main slot 1 (30 stone) -> pack (tops up slot 0, spills)");
    report(session.shift_click(main_start + 1));

    print_session(&session);

    println!("shift-click pack slot 0 -> player (fills hotbar from the end)");
    report(session.shift_click(0));
    print_session(&session);

    println!("shift-click the equipped rucksack itself -> rejected");
    report(session.shift_click(session.equipped_index()));

    let player = session.close();
    println!(
        "session closed; rucksack back in hotbar slot {}",
        player.selected_slot()
    );
    Ok(())
}

fn report(moved: Option<ItemStack>) {
    match moved {
        Some(stack) => println!("  moved {} of item #{}", stack.count, stack.id),
        None => println!("  no transfer"),
    }
}

fn print_session(session: &PackSession) {
    let counts: Vec<String> = session
        .pack()
        .slots()
        .iter()
        .map(|slot| match slot {
            Some(stack) => format!("{}x{}", stack.id, stack.count),
            None => "-".to_string(),
        })
        .collect();
    println!("  pack:   [{}]", counts.join(" "));

    let occupied = session
        .player()
        .slots()
        .iter()
        .enumerate()
        .filter_map(|(slot, stack)| {
            stack
                .as_ref()
                .map(|stack| format!("{slot}:{}x{}", stack.id, stack.count))
        })
        .collect::<Vec<_>>();
    println!("  player: [{}]", occupied.join(" "));
}
