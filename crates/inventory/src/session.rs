//! Container session: one player's view onto an open pack.
//!
//! Session slot indices cover three contiguous ranges: the pack itself
//! (`0..P`), the player's main inventory (`P..P+27`), and the hotbar
//! (`P+27..P+36`). The shift-click transfer policy and the stack-limit-aware
//! merge both operate on these ranges.

use std::ops::Range;
use std::sync::Arc;

use tracing::trace;

use satchel_core::{ItemRegistry, ItemStack};

use crate::backed::{PackConfig, PackError, PackInventory};
use crate::player::{PlayerInventory, HOTBAR_SIZE, MAIN_SIZE};

/// An open pack plus the player inventory it trades stacks with.
///
/// The pack's owner stack stays logically in the player's selected hotbar
/// slot while the session is open; gestures targeting that slot are
/// rejected, since moving the owner would invalidate the backing store.
#[derive(Debug)]
pub struct PackSession {
    pack: PackInventory,
    player: PlayerInventory,
    registry: Arc<ItemRegistry>,
    /// Session index of the hotbar slot holding the open pack.
    equipped_index: usize,
}

impl PackSession {
    /// Open a session on the stack equipped in the player's selected
    /// hotbar slot.
    pub fn open(
        mut player: PlayerInventory,
        registry: Arc<ItemRegistry>,
        config: &PackConfig,
    ) -> Result<Self, PackError> {
        // Validate before taking the stack so the player inventory is not
        // torn apart on the error path.
        let held = player.selected_stack().ok_or(PackError::EmptyHand)?;
        let def = registry.get(held.id).ok_or(PackError::UnknownItem(held.id))?;
        if !def.is_container() {
            return Err(PackError::NotAContainer(def.key.to_string()));
        }

        let selected = player.selected_index();
        let held = player.take(selected).ok_or(PackError::EmptyHand)?;
        let pack = PackInventory::open(held, &registry, config)?;
        let equipped_index = pack.len() + selected;

        Ok(Self {
            pack,
            player,
            registry,
            equipped_index,
        })
    }

    /// The open pack.
    pub fn pack(&self) -> &PackInventory {
        &self.pack
    }

    /// Mutable access to the open pack, e.g. for hosts granting items.
    pub fn pack_mut(&mut self) -> &mut PackInventory {
        &mut self.pack
    }

    /// The player inventory side of the session.
    pub fn player(&self) -> &PlayerInventory {
        &self.player
    }

    /// Mutable access to the player inventory side.
    pub fn player_mut(&mut self) -> &mut PlayerInventory {
        &mut self.player
    }

    /// Session index of the slot holding the open pack.
    pub fn equipped_index(&self) -> usize {
        self.equipped_index
    }

    /// Total number of session slots.
    pub fn slot_count(&self) -> usize {
        self.pack.len() + MAIN_SIZE + HOTBAR_SIZE
    }

    fn pack_len(&self) -> usize {
        self.pack.len()
    }

    fn main_start(&self) -> usize {
        self.pack.len()
    }

    fn hotbar_start(&self) -> usize {
        self.pack.len() + MAIN_SIZE
    }

    /// The stack visible at a session index, the equipped pack included.
    pub fn stack_at(&self, index: usize) -> Option<&ItemStack> {
        if index == self.equipped_index {
            Some(self.pack.owner())
        } else if index < self.pack_len() {
            self.pack.get(index)
        } else {
            self.player.get(index - self.pack_len())
        }
    }

    fn set_at(&mut self, index: usize, stack: Option<ItemStack>) {
        debug_assert_ne!(index, self.equipped_index);
        if index < self.pack_len() {
            self.pack.set(index, stack);
        } else {
            self.player.set(index - self.pack_len(), stack);
        }
    }

    fn accepts_at(&self, index: usize, stack: &ItemStack) -> bool {
        if index < self.pack_len() {
            self.pack.accepts(&self.registry, stack)
        } else {
            true
        }
    }

    /// Capacity of a slot for the given item: the item's own max stack
    /// size, additionally capped by the pack's stack limit for pack slots.
    fn capacity_at(&self, index: usize, id: satchel_core::ItemId) -> u32 {
        let max = self.registry.max_stack_size(id);
        if index < self.pack_len() {
            max.min(self.pack.stack_limit())
        } else {
            max
        }
    }

    /// Fast-transfer the stack at `index` to its counterpart range.
    ///
    /// Policy: pack slots spill into the whole player range (filling from
    /// the end); player slots try the pack first and fall back to the
    /// adjacent player range (main -> hotbar, hotbar -> main) when nothing
    /// was placed. Returns a snapshot of the stack that moved, or `None`
    /// when the gesture was a no-op.
    pub fn shift_click(&mut self, index: usize) -> Option<ItemStack> {
        if index >= self.slot_count() || index == self.equipped_index {
            return None;
        }
        let original = self.stack_at(index)?.clone();
        let mut moving = original.clone();

        let placed = if index < self.pack_len() {
            self.merge_into_range(&mut moving, self.main_start()..self.slot_count(), true)
        } else {
            let mut placed = self.merge_into_range(&mut moving, 0..self.pack_len(), false);
            if !placed {
                let fallback = if index < self.hotbar_start() {
                    self.hotbar_start()..self.slot_count()
                } else {
                    self.main_start()..self.hotbar_start()
                };
                placed = self.merge_into_range(&mut moving, fallback, false);
            }
            placed
        };

        if !placed || moving.count == original.count {
            return None;
        }

        trace!(
            index,
            moved = original.count - moving.count,
            "shift-click transfer"
        );
        if moving.is_empty() {
            self.set_at(index, None);
        } else {
            self.set_at(index, Some(moving));
        }
        Some(original)
    }

    /// Merge `source` into a range of session slots, preferring existing
    /// partial stacks over empty slots.
    ///
    /// Scans forward, or from the end of the range when `reverse` is set.
    /// Pass 1 tops up compatible stacks (same kind, same tag) up to each
    /// slot's capacity; pass 2 spills the remainder into empty acceptable
    /// slots, splitting across several when one slot cannot hold it all.
    /// Capacity-1 inventories depend on that split: a stack of 4 leaves 1
    /// in the slot and 3 in the source instead of losing the rest.
    ///
    /// Returns whether any units were placed; `source` is left holding
    /// whatever did not fit. Indices past the last session slot are
    /// ignored.
    pub fn merge_into_range(
        &mut self,
        source: &mut ItemStack,
        range: Range<usize>,
        reverse: bool,
    ) -> bool {
        // Clamp before scanning: a nonexistent index would read as an
        // empty slot and swallow anything written to it.
        let end = range.end.min(self.slot_count());
        let range = range.start.min(end)..end;

        let mut placed = false;
        let indices: Vec<usize> = if reverse {
            range.rev().collect()
        } else {
            range.collect()
        };

        // Pass 1: top up existing compatible stacks before opening new slots.
        if self.registry.max_stack_size(source.id) > 1 {
            for &index in &indices {
                if source.is_empty() {
                    break;
                }
                if index == self.equipped_index {
                    continue;
                }
                let Some(existing) = self.stack_at(index) else {
                    continue;
                };
                if !existing.can_merge_with(source) {
                    continue;
                }
                let moved = source
                    .count
                    .min(existing.room(self.capacity_at(index, source.id)));
                if moved == 0 {
                    continue;
                }
                let mut updated = existing.clone();
                updated.count += moved;
                source.count -= moved;
                self.set_at(index, Some(updated));
                placed = true;
            }
        }

        // Pass 2: spill the remainder into empty slots.
        if !source.is_empty() {
            for &index in &indices {
                if index == self.equipped_index || self.stack_at(index).is_some() {
                    continue;
                }
                if !self.accepts_at(index, source) {
                    continue;
                }
                let moved = source.count.min(self.capacity_at(index, source.id));
                let mut opened = source.clone();
                opened.count = moved;
                self.set_at(index, Some(opened));
                source.count -= moved;
                placed = true;
                if source.is_empty() {
                    break;
                }
            }
        }

        placed
    }

    /// Close the session, returning the pack to the player's hotbar slot.
    pub fn close(mut self) -> PlayerInventory {
        let slot = self.equipped_index - self.pack.len();
        self.player.set(slot, Some(self.pack.into_owner()));
        self.player
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satchel_core::ItemDef;

    const STONE: satchel_core::ItemId = 0;
    const RUCKSACK: satchel_core::ItemId = 1;
    const APPLE: satchel_core::ItemId = 2;

    fn registry() -> Arc<ItemRegistry> {
        Arc::new(
            ItemRegistry::new(vec![
                ItemDef::simple("stone", 64),
                ItemDef::simple("rucksack", 1).container(),
                ItemDef::simple("apple", 16),
            ])
            .expect("test registry is valid"),
        )
    }

    /// Player with a rucksack equipped in hotbar slot 0.
    fn open_session(config: &PackConfig) -> PackSession {
        let mut player = PlayerInventory::new();
        player.set(MAIN_SIZE, Some(ItemStack::new(RUCKSACK, 1)));
        PackSession::open(player, registry(), config).expect("session opens")
    }

    #[test]
    fn pack_slot_spills_into_hotbar_first() {
        let mut session = open_session(&PackConfig::default());
        session.pack.set(0, Some(ItemStack::new(STONE, 10)));

        let moved = session.shift_click(0).expect("transfer happens");
        assert_eq!(moved.count, 10);
        assert!(session.pack().get(0).is_none());

        // Reverse scan: the last hotbar slot fills before any main slot.
        let last_hotbar = session.slot_count() - 1;
        assert_eq!(session.stack_at(last_hotbar).unwrap().count, 10);
    }

    #[test]
    fn main_slot_moves_into_pack_first() {
        let mut session = open_session(&PackConfig::default());
        let main0 = session.main_start();
        session.player.set(0, Some(ItemStack::new(APPLE, 5)));

        assert!(session.shift_click(main0).is_some());
        assert_eq!(session.pack().get(0).unwrap().count, 5);
        assert!(session.stack_at(main0).is_none());
    }

    #[test]
    fn merge_tops_up_existing_stack_before_opening_new_slot() {
        let mut session = open_session(&PackConfig::default());
        session.pack.set(0, Some(ItemStack::new(STONE, 3)));

        let mut source = ItemStack::new(STONE, 5);
        let placed = session.merge_into_range(&mut source, 0..8, false);

        assert!(placed);
        assert!(source.is_empty());
        assert_eq!(session.pack().get(0).unwrap().count, 8);
        assert!(session.pack().get(1).is_none());
    }

    #[test]
    fn capacity_one_slot_takes_one_and_leaves_three() {
        let config = PackConfig {
            slots: 8,
            stack_limit: 1,
        };
        let mut session = open_session(&config);

        let mut source = ItemStack::new(STONE, 4);
        let placed = session.merge_into_range(&mut source, 0..1, false);

        assert!(placed);
        assert_eq!(session.pack().get(0).unwrap().count, 1);
        assert_eq!(source.count, 3);
    }

    #[test]
    fn capacity_one_pack_splits_across_slots() {
        let config = PackConfig {
            slots: 8,
            stack_limit: 1,
        };
        let mut session = open_session(&config);
        let main0 = session.main_start();
        session.player.set(0, Some(ItemStack::new(STONE, 4)));

        assert!(session.shift_click(main0).is_some());
        for slot in 0..4 {
            assert_eq!(session.pack().get(slot).unwrap().count, 1);
        }
        assert!(session.pack().get(4).is_none());
        assert!(session.stack_at(main0).is_none());
    }

    #[test]
    fn merge_into_full_range_reports_no_placement() {
        let mut session = open_session(&PackConfig::default());
        for slot in 0..8 {
            session.pack.set(slot, Some(ItemStack::new(STONE, 64)));
        }

        let mut source = ItemStack::new(STONE, 1);
        let placed = session.merge_into_range(&mut source, 0..8, false);

        assert!(!placed);
        assert_eq!(source.count, 1);
    }

    #[test]
    fn full_pack_falls_back_to_adjacent_range() {
        let mut session = open_session(&PackConfig::default());
        for slot in 0..8 {
            session.pack.set(slot, Some(ItemStack::new(APPLE, 16)));
        }
        let main0 = session.main_start();
        session.player.set(0, Some(ItemStack::new(STONE, 7)));

        assert!(session.shift_click(main0).is_some());
        assert!(session.stack_at(main0).is_none());
        // Fallback for a main slot is the hotbar, scanned forward; slot 0
        // of the hotbar is reserved by the equipped pack.
        let hotbar1 = session.hotbar_start() + 1;
        assert_eq!(session.stack_at(hotbar1).unwrap().count, 7);
    }

    #[test]
    fn hotbar_slot_falls_back_to_main_range() {
        let mut session = open_session(&PackConfig::default());
        for slot in 0..8 {
            session.pack.set(slot, Some(ItemStack::new(APPLE, 16)));
        }
        let hotbar3 = session.hotbar_start() + 3;
        session
            .player
            .set(MAIN_SIZE + 3, Some(ItemStack::new(STONE, 9)));

        assert!(session.shift_click(hotbar3).is_some());
        assert!(session.stack_at(hotbar3).is_none());
        assert_eq!(session.stack_at(session.main_start()).unwrap().count, 9);
    }

    #[test]
    fn container_stack_never_enters_the_pack() {
        let mut session = open_session(&PackConfig::default());
        let main0 = session.main_start();
        session.player.set(0, Some(ItemStack::new(RUCKSACK, 1)));

        assert!(session.shift_click(main0).is_some());
        // Rejected by the pack, landed in the hotbar fallback instead.
        assert!(session.pack().is_empty());
        let hotbar1 = session.hotbar_start() + 1;
        assert_eq!(session.stack_at(hotbar1).unwrap().id, RUCKSACK);
    }

    #[test]
    fn equipped_pack_cannot_be_moved() {
        let mut session = open_session(&PackConfig::default());
        let equipped = session.equipped_index();

        assert!(session.shift_click(equipped).is_none());
        assert_eq!(session.stack_at(equipped).unwrap().id, RUCKSACK);
    }

    #[test]
    fn spill_from_pack_skips_the_equipped_slot() {
        let mut session = open_session(&PackConfig::default());
        // Fill every player slot except the reserved one.
        for slot in 0..crate::player::PLAYER_SLOT_COUNT {
            if session.pack.len() + slot == session.equipped_index() {
                continue;
            }
            session.player.set(slot, Some(ItemStack::new(APPLE, 16)));
        }
        session.pack.set(0, Some(ItemStack::new(STONE, 5)));

        // Nowhere to go: every other slot is full and the equipped slot is
        // off limits.
        assert!(session.shift_click(0).is_none());
        assert_eq!(session.pack().get(0).unwrap().count, 5);
    }

    #[test]
    fn merge_range_is_clamped_to_session_slots() {
        let mut session = open_session(&PackConfig::default());
        for slot in 0..session.pack.len() {
            session.pack.set(slot, Some(ItemStack::new(STONE, 64)));
        }
        for slot in 0..crate::player::PLAYER_SLOT_COUNT {
            if session.pack.len() + slot == session.equipped_index() {
                continue;
            }
            session.player.set(slot, Some(ItemStack::new(STONE, 64)));
        }

        // Every legal slot is full; indices past the end must not count
        // as empty slots and swallow the source.
        let mut source = ItemStack::new(STONE, 10);
        let placed = session.merge_into_range(&mut source, 0..session.slot_count() + 4, false);

        assert!(!placed);
        assert_eq!(source.count, 10);
    }

    #[test]
    fn close_returns_pack_with_contents_to_hotbar() {
        let registry = registry();
        let mut session = open_session(&PackConfig::default());
        session.pack.set(2, Some(ItemStack::new(APPLE, 4)));

        let player = session.close();
        let held = player.get(MAIN_SIZE).expect("pack is back in its slot");
        assert_eq!(held.id, RUCKSACK);

        let reopened =
            PackInventory::open(held.clone(), &registry, &PackConfig::default()).unwrap();
        assert_eq!(reopened.get(2).unwrap().count, 4);
    }

    #[test]
    fn open_requires_a_container_in_hand() {
        let mut player = PlayerInventory::new();
        let err = PackSession::open(player.clone(), registry(), &PackConfig::default())
            .expect_err("empty hand");
        assert!(matches!(err, PackError::EmptyHand));

        player.set(MAIN_SIZE, Some(ItemStack::new(STONE, 1)));
        let err = PackSession::open(player, registry(), &PackConfig::default())
            .expect_err("stone is not a container");
        assert!(matches!(err, PackError::NotAContainer(_)));
    }
}
