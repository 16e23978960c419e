//! Removed world objects and their timed respawn.

use tracing::trace;

use crate::game::keys::ObjectAnchor;
use crate::game::state::SimulationState;

/// Ticks a removed world object stays gone.
pub const WORLD_PROP_RESET_TICKS: u32 = 600;

impl SimulationState {
    /// Mark an object removed at `tick`. Re-marking keeps the original tick.
    pub fn mark_removed(&mut self, anchor: ObjectAnchor, tick: u32) -> bool {
        if self.removed_objects.contains_key(&anchor) {
            return false;
        }
        self.removed_objects.insert(anchor, tick);
        self.removed_object_count = self.removed_objects.len() as u32;
        true
    }

    /// Delete removals that have lasted [`WORLD_PROP_RESET_TICKS`] by `now`.
    ///
    /// Returns the anchors that became available again, in key order.
    pub fn expire_removals(&mut self, now: u32) -> Vec<ObjectAnchor> {
        let mut respawned = Vec::new();
        self.removed_objects.retain(|anchor, at| {
            let expired = now.wrapping_sub(*at) >= WORLD_PROP_RESET_TICKS;
            if expired {
                trace!(%anchor, removed_at = *at, now, "object respawned");
                respawned.push(*anchor);
            }
            !expired
        });
        self.removed_object_count = self.removed_objects.len() as u32;
        respawned
    }
}
