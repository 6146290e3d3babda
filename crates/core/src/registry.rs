//! Namespaced item keys and the item definition registry.
//!
//! Item keys are stable string identifiers used for authoring and
//! data-driven definitions (e.g., `satchel:rucksack`). They are ordered and
//! validated to support deterministic iteration and stable persistence.
//! The registry maps dense numeric ids onto definitions; all capability
//! checks (stack limits, container flag) go through it rather than through
//! item type identity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default namespace used when a key omits an explicit namespace.
pub const DEFAULT_NAMESPACE: &str = "satchel";

/// Dense numeric item identifier assigned at registration time.
pub type ItemId = u16;

/// Error returned when parsing an invalid [`ItemKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ItemKeyError {
    message: String,
}

impl ItemKeyError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A namespaced key of the form `namespace:path`.
///
/// Ordering is lexical by `(namespace, path)` and is stable across runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    namespace: String,
    path: String,
}

impl ItemKey {
    /// Parse an item key.
    ///
    /// Accepts either:
    /// - `namespace:path`
    /// - `path` (uses [`DEFAULT_NAMESPACE`])
    pub fn parse(input: &str) -> Result<Self, ItemKeyError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ItemKeyError::new("ItemKey cannot be empty"));
        }

        let (namespace, path) = match input.split_once(':') {
            Some((ns, p)) => (ns, p),
            None => (DEFAULT_NAMESPACE, input),
        };

        let namespace = namespace.trim();
        let path = path.trim();

        validate_segment(namespace, "namespace")?;
        validate_segment(path, "path")?;

        Ok(Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    /// Key namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for ItemKey {
    type Err = ItemKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn validate_segment(segment: &str, label: &str) -> Result<(), ItemKeyError> {
    if segment.is_empty() {
        return Err(ItemKeyError::new(format!("ItemKey {label} cannot be empty")));
    }
    if segment.len() > 64 {
        return Err(ItemKeyError::new(format!("ItemKey {label} too long (max 64)")));
    }
    if !segment
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.'))
    {
        return Err(ItemKeyError::new(format!(
            "ItemKey {label} contains invalid characters: {segment}"
        )));
    }
    Ok(())
}

bitflags::bitflags! {
    /// Capability flags carried by an item definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ItemFlags: u8 {
        /// Item hosts a pack inventory inside its tag. Container-flagged
        /// stacks are never accepted into pack slots (no pack-in-pack).
        const CONTAINER = 1 << 0;
    }
}

/// Item metadata loaded from definition files or built in code.
#[derive(Debug, Clone)]
pub struct ItemDef {
    /// Stable namespaced key (e.g., `satchel:rucksack`).
    pub key: ItemKey,
    /// Human-readable name for display purposes.
    pub display_name: String,
    /// Largest count a single stack of this item may hold (>= 1).
    pub max_stack_size: u32,
    /// Capability flags.
    pub flags: ItemFlags,
}

impl ItemDef {
    /// Construct a definition from its JSON form.
    pub fn from_definition(def: ItemDefinition) -> Result<Self, RegistryError> {
        let key = ItemKey::parse(&def.name).map_err(RegistryError::InvalidKey)?;
        let display_name = def.display.unwrap_or_else(|| key.path().to_string());
        let mut flags = ItemFlags::empty();
        if def.container {
            flags |= ItemFlags::CONTAINER;
        }
        Ok(Self {
            key,
            display_name,
            max_stack_size: def.max_stack.max(1),
            flags,
        })
    }

    /// Helper for tests and defaults that need a simple definition.
    ///
    /// Panics on an invalid key, so only call it with literal names.
    pub fn simple(name: &str, max_stack: u32) -> Self {
        let key = ItemKey::parse(name).expect("literal item key is valid");
        Self {
            display_name: key.path().to_string(),
            key,
            max_stack_size: max_stack.max(1),
            flags: ItemFlags::empty(),
        }
    }

    /// Mark this definition as a container item.
    pub fn container(mut self) -> Self {
        self.flags |= ItemFlags::CONTAINER;
        self
    }

    /// Whether this item hosts a pack inventory.
    pub fn is_container(&self) -> bool {
        self.flags.contains(ItemFlags::CONTAINER)
    }
}

/// JSON definition for a single item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDefinition {
    /// Namespaced key, namespace optional (e.g., `rucksack` or `satchel:rucksack`).
    pub name: String,
    /// Display name shown to players; defaults to the key path.
    #[serde(default)]
    pub display: Option<String>,
    /// Maximum stack size; defaults to 64.
    #[serde(default = "default_max_stack")]
    pub max_stack: u32,
    /// Whether the item hosts a pack inventory.
    #[serde(default)]
    pub container: bool,
}

fn default_max_stack() -> u32 {
    64
}

/// Error raised while building an [`ItemRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two definitions share the same key.
    #[error("duplicate item key `{0}`")]
    DuplicateKey(ItemKey),
    /// A definition carries an unparseable key.
    #[error("invalid item key: {0}")]
    InvalidKey(#[source] ItemKeyError),
    /// More definitions than [`ItemId`] can index.
    #[error("too many item definitions (max {})", ItemId::MAX)]
    TooManyItems,
}

/// Registry storing item definitions keyed by dense id.
#[derive(Debug, Default)]
pub struct ItemRegistry {
    defs: Vec<ItemDef>,
    key_to_id: HashMap<ItemKey, ItemId>,
}

impl ItemRegistry {
    /// Construct a registry from the supplied definitions.
    ///
    /// Ids are assigned in definition order, so definition files double as
    /// a stable id mapping for persisted stacks.
    pub fn new(defs: Vec<ItemDef>) -> Result<Self, RegistryError> {
        if defs.len() > ItemId::MAX as usize {
            return Err(RegistryError::TooManyItems);
        }
        let mut key_to_id = HashMap::new();
        for (id, def) in defs.iter().enumerate() {
            if key_to_id.insert(def.key.clone(), id as ItemId).is_some() {
                return Err(RegistryError::DuplicateKey(def.key.clone()));
            }
        }
        Ok(Self { defs, key_to_id })
    }

    /// Build a registry straight from JSON definitions.
    pub fn from_definitions(defs: Vec<ItemDefinition>) -> Result<Self, RegistryError> {
        let defs = defs
            .into_iter()
            .map(ItemDef::from_definition)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(defs)
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns true when no items are registered.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Fetch a definition by id.
    pub fn get(&self, id: ItemId) -> Option<&ItemDef> {
        self.defs.get(id as usize)
    }

    /// Resolve a key to its dense id.
    pub fn id_for(&self, key: &ItemKey) -> Option<ItemId> {
        self.key_to_id.get(key).copied()
    }

    /// Maximum stack size for an item. Unknown ids are treated as
    /// unstackable so malformed data never over-fills a slot.
    pub fn max_stack_size(&self, id: ItemId) -> u32 {
        self.get(id).map(|def| def.max_stack_size).unwrap_or(1)
    }

    /// Whether the item hosts a pack inventory.
    pub fn is_container(&self, id: ItemId) -> bool {
        self.get(id).map(|def| def.is_container()).unwrap_or(false)
    }
}
