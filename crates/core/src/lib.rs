#![warn(missing_docs)]
//! Core item primitives shared across the workspace.

pub mod item;
pub mod registry;

// Re-export commonly used types
pub use item::{ItemStack, Tag};
pub use registry::{
    ItemDef, ItemDefinition, ItemFlags, ItemId, ItemKey, ItemKeyError, ItemRegistry, RegistryError,
    DEFAULT_NAMESPACE,
};
