//! Tool configuration and item definition loading.

use satchel_core::{ItemDefinition, ItemRegistry};
use satchel_inventory::PackConfig;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "config/satchel.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SatchelConfig {
    /// Number of slots in a pack.
    pub pack_slots: usize,
    /// Per-slot stack limit inside a pack.
    pub pack_stack_limit: u32,
    /// Path to the item definition file.
    pub items_path: String,
}

impl Default for SatchelConfig {
    fn default() -> Self {
        Self {
            pack_slots: 8,
            pack_stack_limit: 64,
            items_path: "config/items.json".to_string(),
        }
    }
}

impl SatchelConfig {
    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<SatchelConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    SatchelConfig::default()
                }
            },
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound
                    || path != Path::new(DEFAULT_CONFIG_PATH)
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                SatchelConfig::default()
            }
        }
    }

    /// Pack sizing derived from this configuration.
    pub fn pack_config(&self) -> PackConfig {
        PackConfig {
            slots: self.pack_slots,
            stack_limit: self.pack_stack_limit,
        }
    }
}

/// Load the item registry from a JSON definition file, falling back to the
/// built-in definitions when the file is missing or invalid.
pub fn load_item_registry(path: &Path) -> ItemRegistry {
    let defs = match fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<Vec<ItemDefinition>>(&contents) {
            Ok(defs) => defs,
            Err(err) => {
                warn!(
                    "Failed to parse {}: {err}. Using built-in items",
                    path.display()
                );
                default_definitions()
            }
        },
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "Failed to read {}: {err}. Using built-in items",
                    path.display()
                );
            }
            default_definitions()
        }
    };

    match ItemRegistry::from_definitions(defs) {
        Ok(registry) => registry,
        Err(err) => {
            warn!("Invalid item definitions: {err}. Using built-in items");
            ItemRegistry::from_definitions(default_definitions())
                .expect("built-in item definitions are valid")
        }
    }
}

/// Built-in item set used when no definition file is present.
pub fn default_definitions() -> Vec<ItemDefinition> {
    let defs = serde_json::json!([
        {"name": "rucksack", "display": "Rucksack", "max_stack": 1, "container": true},
        {"name": "stone", "display": "Stone"},
        {"name": "apple", "display": "Apple", "max_stack": 16},
        {"name": "torch", "display": "Torch"},
        {"name": "iron_sword", "display": "Iron Sword", "max_stack": 1},
    ]);
    serde_json::from_value(defs).expect("built-in item definitions parse")
}
