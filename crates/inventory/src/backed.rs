//! Pack inventory persisted inside a container item's tag.
//!
//! A [`PackInventory`] is a fixed-size slot array owned 1:1 by a container
//! item stack. Contents are serialized as a sparse list of `(slot, stack)`
//! records under a named key in the owner's tag; every mutation writes the
//! tag back so the owner stack is always safe to hand around.

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use satchel_core::{ItemId, ItemRegistry, ItemStack, Tag};

/// Tag key holding the sparse slot record list.
pub const CONTENTS_KEY: &str = "Contents";

/// Tag key holding the pack's instance UUID.
///
/// Assigned on first open so a specific pack can be told apart from any
/// other stack of the same kind, even an otherwise identical one.
pub const INSTANCE_ID_KEY: &str = "PackId";

/// Sizing and limits for a pack inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Number of slots in the pack.
    pub slots: usize,
    /// Per-slot stack limit inside the pack. Items with a smaller max
    /// stack size are capped by their own limit instead.
    pub stack_limit: u32,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            slots: 8,
            stack_limit: 64,
        }
    }
}

/// Errors raised by pack inventories and sessions.
#[derive(Debug, Error)]
pub enum PackError {
    /// The owner stack's item id is not in the registry.
    #[error("item id {0} is not registered")]
    UnknownItem(ItemId),
    /// The owner stack's item does not carry the container flag.
    #[error("item `{0}` is not a container")]
    NotAContainer(String),
    /// The acting player has nothing in the selected hotbar slot.
    #[error("no item equipped in the selected slot")]
    EmptyHand,
    /// No view factory registered under the requested id.
    #[error("no view registered for id {0}")]
    UnknownView(u32),
}

/// One persisted slot entry: the slot index plus the stack occupying it.
#[derive(Debug, Serialize, Deserialize)]
struct SlotRecord {
    slot: usize,
    #[serde(flatten)]
    stack: ItemStack,
}

/// Fixed-size inventory backed by a container item's tag.
#[derive(Debug, Clone)]
pub struct PackInventory {
    owner: ItemStack,
    slots: Vec<Option<ItemStack>>,
    stack_limit: u32,
    instance_id: Uuid,
}

impl PackInventory {
    /// Open the pack stored in `owner`.
    ///
    /// Ensures the owner carries an object tag and an instance id, then
    /// loads contents. Malformed or out-of-range records are dropped with
    /// a warning rather than failing the whole inventory.
    pub fn open(
        mut owner: ItemStack,
        registry: &ItemRegistry,
        config: &PackConfig,
    ) -> Result<Self, PackError> {
        let def = registry
            .get(owner.id)
            .ok_or(PackError::UnknownItem(owner.id))?;
        if !def.is_container() {
            return Err(PackError::NotAContainer(def.key.to_string()));
        }

        if !matches!(owner.tag, Some(Tag::Object(_))) {
            if owner.tag.is_some() {
                warn!(item = %def.key, "replacing non-object tag on container item");
            }
            owner.tag = Some(json!({}));
        }

        let stack_limit = config.stack_limit.max(1);
        let mut slots: Vec<Option<ItemStack>> = vec![None; config.slots];
        let instance_id = Self::load_tag(&mut owner, &mut slots, stack_limit);

        let mut pack = Self {
            owner,
            slots,
            stack_limit,
            instance_id,
        };
        // Rewrite immediately so dropped records do not resurface later.
        pack.persist();
        Ok(pack)
    }

    fn load_tag(owner: &mut ItemStack, slots: &mut [Option<ItemStack>], stack_limit: u32) -> Uuid {
        // open() just guaranteed the object tag
        let Some(Tag::Object(tag)) = owner.tag.as_mut() else {
            return Uuid::new_v4();
        };

        let instance_id = tag
            .get(INSTANCE_ID_KEY)
            .and_then(|value| value.as_str())
            .and_then(|text| Uuid::parse_str(text).ok())
            .unwrap_or_else(|| {
                let fresh = Uuid::new_v4();
                tag.insert(INSTANCE_ID_KEY.to_string(), json!(fresh.to_string()));
                fresh
            });

        if let Some(contents) = tag.get(CONTENTS_KEY) {
            let Some(records) = contents.as_array() else {
                warn!("pack contents tag is not a list; discarding");
                return instance_id;
            };
            for value in records {
                let record: SlotRecord = match serde_json::from_value(value.clone()) {
                    Ok(record) => record,
                    Err(err) => {
                        warn!(%err, "dropping malformed pack slot record");
                        continue;
                    }
                };
                if record.slot >= slots.len() {
                    warn!(
                        slot = record.slot,
                        size = slots.len(),
                        "dropping out-of-range pack slot record"
                    );
                    continue;
                }
                if record.stack.is_empty() {
                    continue;
                }
                let mut stack = record.stack;
                stack.count = stack.count.min(stack_limit);
                slots[record.slot] = Some(stack);
            }
        }

        instance_id
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true when every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_none())
    }

    /// Per-slot stack limit.
    pub fn stack_limit(&self) -> u32 {
        self.stack_limit
    }

    /// UUID distinguishing this pack instance from any other stack.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// The container stack this inventory lives in.
    pub fn owner(&self) -> &ItemStack {
        &self.owner
    }

    /// All slots, for display and inspection.
    pub fn slots(&self) -> &[Option<ItemStack>] {
        &self.slots
    }

    /// Get the stack in a slot.
    pub fn get(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot)?.as_ref()
    }

    /// Set a slot's contents and persist.
    ///
    /// Counts are clamped to the pack's stack limit and a count of 0 is
    /// normalized to an empty slot. This and [`split`](Self::split) are the
    /// only mutation paths, so the owner tag never goes stale.
    pub fn set(&mut self, slot: usize, stack: Option<ItemStack>) -> bool {
        if slot >= self.slots.len() {
            return false;
        }
        self.slots[slot] = stack.filter(|s| !s.is_empty()).map(|mut s| {
            s.count = s.count.min(self.stack_limit);
            s
        });
        self.persist();
        true
    }

    /// Remove up to `amount` units from a slot, persisting the change.
    ///
    /// Takes the whole stack when `amount` covers it.
    pub fn split(&mut self, slot: usize, amount: u32) -> Option<ItemStack> {
        if amount == 0 || slot >= self.slots.len() {
            return None;
        }
        let count = self.slots[slot].as_ref()?.count;
        let taken = if amount >= count {
            self.slots[slot].take()
        } else {
            self.slots[slot].as_mut().and_then(|stack| stack.split(amount))
        };
        self.persist();
        taken
    }

    /// Whether a stack may be stored in this pack.
    ///
    /// Container-flagged items are rejected: nesting a pack inside a pack
    /// would make the inner contents unreachable.
    pub fn accepts(&self, registry: &ItemRegistry, stack: &ItemStack) -> bool {
        !registry.is_container(stack.id)
    }

    /// Hand the owner stack (with serialized contents) back to the caller.
    pub fn into_owner(self) -> ItemStack {
        self.owner
    }

    /// Rewrite the contents list in the owner tag.
    fn persist(&mut self) {
        let records: Vec<SlotRecord> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, stack)| {
                stack.as_ref().map(|stack| SlotRecord {
                    slot,
                    stack: stack.clone(),
                })
            })
            .collect();
        let populated = records.len();
        // Slot records are plain data; serializing them cannot fail.
        let value = serde_json::to_value(records).expect("slot records serialize");

        let Some(Tag::Object(tag)) = self.owner.tag.as_mut() else {
            // open() guarantees an object tag
            return;
        };
        tag.insert(CONTENTS_KEY.to_string(), value);
        debug!(populated, "persisted pack contents");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satchel_core::ItemDef;

    const STONE: ItemId = 0;
    const RUCKSACK: ItemId = 1;
    const APPLE: ItemId = 2;

    fn registry() -> ItemRegistry {
        ItemRegistry::new(vec![
            ItemDef::simple("stone", 64),
            ItemDef::simple("rucksack", 1).container(),
            ItemDef::simple("apple", 16),
        ])
        .expect("test registry is valid")
    }

    fn open_pack() -> PackInventory {
        PackInventory::open(
            ItemStack::new(RUCKSACK, 1),
            &registry(),
            &PackConfig::default(),
        )
        .expect("rucksack opens")
    }

    #[test]
    fn set_clamps_to_stack_limit() {
        let mut pack = open_pack();
        assert!(pack.set(0, Some(ItemStack::new(STONE, 200))));
        assert_eq!(pack.get(0).unwrap().count, 64);
    }

    #[test]
    fn set_normalizes_zero_count_to_empty() {
        let mut pack = open_pack();
        pack.set(0, Some(ItemStack::new(STONE, 0)));
        assert!(pack.get(0).is_none());
        assert!(pack.is_empty());
    }

    #[test]
    fn set_out_of_range_is_rejected() {
        let mut pack = open_pack();
        assert!(!pack.set(8, Some(ItemStack::new(STONE, 1))));
    }

    #[test]
    fn split_takes_partial_and_whole_stacks() {
        let mut pack = open_pack();
        pack.set(3, Some(ItemStack::new(STONE, 10)));

        let taken = pack.split(3, 4).unwrap();
        assert_eq!(taken.count, 4);
        assert_eq!(pack.get(3).unwrap().count, 6);

        let rest = pack.split(3, 99).unwrap();
        assert_eq!(rest.count, 6);
        assert!(pack.get(3).is_none());

        assert!(pack.split(3, 1).is_none());
    }

    #[test]
    fn contents_round_trip_through_owner_tag() {
        let registry = registry();
        let config = PackConfig::default();

        let mut pack = open_pack();
        pack.set(0, Some(ItemStack::new(STONE, 12)));
        pack.set(5, Some(ItemStack::new(APPLE, 3)));
        let first_id = pack.instance_id();

        let owner = pack.into_owner();
        let reopened = PackInventory::open(owner, &registry, &config).unwrap();

        assert_eq!(reopened.get(0), Some(&ItemStack::new(STONE, 12)));
        assert!(reopened.get(1).is_none());
        assert_eq!(reopened.get(5), Some(&ItemStack::new(APPLE, 3)));
        assert_eq!(reopened.instance_id(), first_id);
    }

    #[test]
    fn out_of_range_records_are_dropped_on_load() {
        let registry = registry();
        let owner = ItemStack::with_tag(
            RUCKSACK,
            1,
            json!({
                "Contents": [
                    {"slot": 2, "id": STONE, "count": 7},
                    {"slot": 8, "id": STONE, "count": 5},
                    {"slot": 99, "id": APPLE, "count": 1},
                ]
            }),
        );

        let pack = PackInventory::open(owner, &registry, &PackConfig::default()).unwrap();
        assert_eq!(pack.get(2).unwrap().count, 7);
        assert_eq!(pack.slots().iter().filter(|s| s.is_some()).count(), 1);
    }

    #[test]
    fn malformed_records_do_not_fail_the_load() {
        let registry = registry();
        let owner = ItemStack::with_tag(
            RUCKSACK,
            1,
            json!({
                "Contents": [
                    "garbage",
                    {"slot": 0},
                    {"slot": 1, "id": APPLE, "count": 2},
                    {"slot": 4, "id": STONE, "count": 0},
                ]
            }),
        );

        let pack = PackInventory::open(owner, &registry, &PackConfig::default()).unwrap();
        assert_eq!(pack.get(1).unwrap().count, 2);
        assert_eq!(pack.slots().iter().filter(|s| s.is_some()).count(), 1);

        // The rewrite on open scrubbed the bad records from the tag.
        let owner = pack.into_owner();
        let contents = &owner.tag.as_ref().unwrap()[CONTENTS_KEY];
        assert_eq!(contents.as_array().unwrap().len(), 1);
    }

    #[test]
    fn loaded_counts_are_clamped() {
        let registry = registry();
        let owner = ItemStack::with_tag(
            RUCKSACK,
            1,
            json!({"Contents": [{"slot": 0, "id": STONE, "count": 500}]}),
        );
        let pack = PackInventory::open(owner, &registry, &PackConfig::default()).unwrap();
        assert_eq!(pack.get(0).unwrap().count, 64);
    }

    #[test]
    fn container_items_are_never_accepted() {
        let registry = registry();
        let pack = open_pack();
        assert!(!pack.accepts(&registry, &ItemStack::new(RUCKSACK, 1)));
        assert!(pack.accepts(&registry, &ItemStack::new(STONE, 1)));
    }

    #[test]
    fn non_container_item_cannot_open() {
        let err = PackInventory::open(
            ItemStack::new(STONE, 1),
            &registry(),
            &PackConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PackError::NotAContainer(_)));
    }

    #[test]
    fn instance_id_is_assigned_on_first_open() {
        let pack = open_pack();
        let owner = pack.into_owner();
        let id_text = owner.tag.as_ref().unwrap()[INSTANCE_ID_KEY]
            .as_str()
            .unwrap()
            .to_string();
        assert!(Uuid::parse_str(&id_text).is_ok());
    }
}
