//! Item stacks: a quantity of one item kind plus optional structured tag data.

use serde::{Deserialize, Serialize};

use crate::registry::ItemId;

/// Structured metadata attached to a stack (durability, pack contents, ...).
///
/// Uses the generic JSON value type so nested data round-trips without the
/// core crate knowing every consumer's schema.
pub type Tag = serde_json::Value;

/// A stack of items occupying one inventory slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item kind identifier, resolved through the item registry.
    pub id: ItemId,
    /// Number of items in this stack. A count of 0 means the slot is
    /// treated as empty and is normalized away by inventories.
    pub count: u32,
    /// Optional structured metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
}

impl ItemStack {
    /// Create a new item stack without tag data.
    pub fn new(id: ItemId, count: u32) -> Self {
        Self {
            id,
            count,
            tag: None,
        }
    }

    /// Create an item stack carrying tag data.
    pub fn with_tag(id: ItemId, count: u32, tag: Tag) -> Self {
        Self {
            id,
            count,
            tag: Some(tag),
        }
    }

    /// Whether the stack holds nothing.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Check if this stack can combine with another: same kind, same tag.
    pub fn can_merge_with(&self, other: &ItemStack) -> bool {
        self.id == other.id && self.tag == other.tag
    }

    /// Remaining room given a slot capacity.
    pub fn room(&self, capacity: u32) -> u32 {
        capacity.saturating_sub(self.count)
    }

    /// Split this stack, taking `amount` into a new stack.
    ///
    /// Returns `None` when `amount` is 0 or exceeds the current count.
    pub fn split(&mut self, amount: u32) -> Option<ItemStack> {
        if amount == 0 || amount > self.count {
            return None;
        }

        self.count -= amount;
        Some(ItemStack {
            id: self.id,
            count: amount,
            tag: self.tag.clone(),
        })
    }
}
