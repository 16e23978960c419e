//! Viewport animation fingerprint.
//!
//! Hashes the animated tile shown at every cell of the view around the
//! avatar. Kept separate from the state fingerprint: animation phase is
//! derived from the tick, not stored in state.

use crate::core::hash::{Fingerprint, StateHasher};
use crate::game::keys::Cell;
use crate::game::state::SimulationState;
use crate::game::world::WorldQuery;

/// Viewport width in cells.
pub const VIEW_W: i32 = 11;
/// Viewport height in cells.
pub const VIEW_H: i32 = 11;

/// Fingerprint the animated viewport centred on the avatar.
pub fn animation_fingerprint(state: &SimulationState, world: &dyn WorldQuery) -> Fingerprint {
    let mut h = StateHasher::new();
    let centre = state.world.avatar_cell();

    h.update_u32(state.tick);
    h.update_i32(centre.x);
    h.update_i32(centre.y);
    h.update_i32(centre.z);

    let left = centre.x - VIEW_W / 2;
    let top = centre.y - VIEW_H / 2;
    for vy in 0..VIEW_H {
        for vx in 0..VIEW_W {
            let cell = Cell::new(left + vx, top + vy, centre.z);
            let tile = world.animated_tile(state.tick, world.base_tile(cell));
            h.update_i32(cell.x);
            h.update_i32(cell.y);
            h.update_u32(u32::from(tile));
        }
    }

    h.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::{OpenWorld, StaticWorld};

    #[test]
    fn test_phase_changes_hash() {
        let world = StaticWorld::demo();
        let mut state = SimulationState::default();
        let a = animation_fingerprint(&state, &world);
        state.tick = 2;
        let b = animation_fingerprint(&state, &world);
        assert_ne!(a, b);
    }

    #[test]
    fn test_static_world_depends_on_tick_only_through_header() {
        let mut state = SimulationState::default();
        let a = animation_fingerprint(&state, &OpenWorld);
        assert_eq!(a, animation_fingerprint(&state, &OpenWorld));
        state.world.map_x += 1;
        assert_ne!(a, animation_fingerprint(&state, &OpenWorld));
    }
}
