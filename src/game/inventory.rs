//! Inventory counts keyed by item (type, frame).

use crate::game::keys::ItemKey;
use crate::game::state::SimulationState;

impl SimulationState {
    /// Add one unit of `key`. Returns the new count.
    pub fn add_item(&mut self, key: ItemKey) -> u32 {
        let count = self.inventory.entry(key).or_insert(0);
        *count = count.wrapping_add(1).max(1);
        *count
    }

    /// Remove one unit of `key`, deleting the entry at zero.
    ///
    /// Returns the remaining count, or `None` when the item is not held.
    pub fn remove_item(&mut self, key: &ItemKey) -> Option<u32> {
        let count = self.inventory.get_mut(key)?;
        if *count <= 1 {
            self.inventory.remove(key);
            return Some(0);
        }
        *count -= 1;
        Some(*count)
    }

    /// Lowest-sorted held item.
    pub fn first_item(&self) -> Option<ItemKey> {
        self.inventory
            .iter()
            .find(|(_, n)| **n > 0)
            .map(|(k, _)| *k)
    }
}
