//! Player-side inventory: 27 main slots plus a 9-slot hotbar.

use serde::{Deserialize, Serialize};

use satchel_core::ItemStack;

/// Number of main inventory slots.
pub const MAIN_SIZE: usize = 27;

/// Number of hotbar slots.
pub const HOTBAR_SIZE: usize = 9;

/// Total player slots. Slots `0..27` are the main inventory, `27..36` the
/// hotbar; this matches the slot ranges a pack session exposes.
pub const PLAYER_SLOT_COUNT: usize = MAIN_SIZE + HOTBAR_SIZE;

/// The acting player's own inventory.
#[derive(Debug, Clone)]
pub struct PlayerInventory {
    slots: [Option<ItemStack>; PLAYER_SLOT_COUNT],
    /// Currently selected hotbar slot (0-8).
    selected: usize,
}

// Serde is implemented by hand because arrays longer than 32 elements
// cannot derive it; the slot list and the selected hotbar slot travel
// together so a save/load round-trip keeps the equipped stack.
impl Serialize for PlayerInventory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("PlayerInventory", 2)?;
        state.serialize_field("slots", &self.slots[..])?;
        state.serialize_field("selected", &self.selected)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for PlayerInventory {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Record {
            slots: Vec<Option<ItemStack>>,
            #[serde(default)]
            selected: usize,
        }

        let record = Record::deserialize(deserializer)?;
        if record.slots.len() != PLAYER_SLOT_COUNT {
            return Err(serde::de::Error::custom(format!(
                "Expected {} slots, got {}",
                PLAYER_SLOT_COUNT,
                record.slots.len()
            )));
        }

        let slots: [Option<ItemStack>; PLAYER_SLOT_COUNT] = record
            .slots
            .try_into()
            .map_err(|_| serde::de::Error::custom("Failed to convert to array"))?;

        Ok(PlayerInventory {
            slots,
            selected: record.selected.min(HOTBAR_SIZE - 1),
        })
    }
}

impl PlayerInventory {
    /// Create a new empty inventory.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            selected: 0,
        }
    }

    /// Get the stack at a slot.
    pub fn get(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot)?.as_ref()
    }

    /// Set a slot's contents. Out-of-range indices are rejected.
    pub fn set(&mut self, slot: usize, stack: Option<ItemStack>) -> bool {
        if slot >= PLAYER_SLOT_COUNT {
            return false;
        }
        self.slots[slot] = stack.filter(|s| !s.is_empty());
        true
    }

    /// Take a stack out of a slot, leaving it empty.
    pub fn take(&mut self, slot: usize) -> Option<ItemStack> {
        self.slots.get_mut(slot)?.take()
    }

    /// All slots, for display and inspection.
    pub fn slots(&self) -> &[Option<ItemStack>] {
        &self.slots
    }

    /// Currently selected hotbar slot (0-8).
    pub fn selected_slot(&self) -> usize {
        self.selected
    }

    /// Absolute index of the selected hotbar slot.
    pub fn selected_index(&self) -> usize {
        MAIN_SIZE + self.selected
    }

    /// Set the selected hotbar slot (0-8).
    pub fn set_selected_slot(&mut self, slot: usize) {
        if slot < HOTBAR_SIZE {
            self.selected = slot;
        }
    }

    /// The stack currently equipped in the selected hotbar slot.
    pub fn selected_stack(&self) -> Option<&ItemStack> {
        self.get(self.selected_index())
    }
}

impl Default for PlayerInventory {
    fn default() -> Self {
        Self::new()
    }
}
