//! Collision and Target Resolution
//!
//! Deterministic cell-level blocking checks and "which object is at this
//! cell" queries. All map knowledge comes through [`WorldQuery`].

use serde::{Deserialize, Serialize};

use crate::game::keys::{Cell, ObjectAnchor};
use crate::game::objects::{is_closeable_door_type, is_furniture_object, is_solid_env_type};
use crate::game::state::SimulationState;
use crate::game::world::{WorldObject, WorldQuery};

/// Largest footprint a world object can have (cells along x and y).
pub const MAX_FOOTPRINT: i32 = 2;

/// Why a cell cannot be entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BlockReason {
    /// Impassable terrain
    Terrain,
    /// Solid scenery or furniture
    Object { type_id: u16 },
    /// A closeable door in its closed state
    ClosedDoor { type_id: u16 },
    /// An occupying creature or NPC
    Entity { id: u32 },
}

/// Result of testing a move destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveCheck {
    /// The destination can be entered
    Clear,
    /// Something stops the move
    Blocked(BlockReason),
    /// Blocked by furniture the avatar can use instead
    Furniture(WorldObject),
}

/// Non-removed objects anchored at `cell`.
pub fn live_objects_at(state: &SimulationState, world: &dyn WorldQuery, cell: Cell) -> Vec<WorldObject> {
    world
        .objects_at(cell)
        .into_iter()
        .filter(|o| !state.is_removed(&ObjectAnchor::of(o)))
        .collect()
}

/// Top live object at `cell`: highest order, then highest load index.
pub fn top_object_at<F>(
    state: &SimulationState,
    world: &dyn WorldQuery,
    cell: Cell,
    filter: F,
) -> Option<WorldObject>
where
    F: Fn(&WorldObject) -> bool,
{
    live_objects_at(state, world, cell)
        .into_iter()
        .filter(|o| filter(o))
        .max_by_key(|o| (o.order, o.index))
}

/// Live objects whose footprint covers `cell`, including multi-tile
/// objects anchored up to [`MAX_FOOTPRINT`]` - 1` cells toward higher x/y.
pub fn objects_covering(state: &SimulationState, world: &dyn WorldQuery, cell: Cell) -> Vec<WorldObject> {
    let mut out = Vec::new();
    for dy in 0..MAX_FOOTPRINT {
        for dx in 0..MAX_FOOTPRINT {
            let anchor = Cell::new(cell.x + dx, cell.y + dy, cell.z);
            for obj in live_objects_at(state, world, anchor) {
                if obj.covers(cell) {
                    out.push(obj);
                }
            }
        }
    }
    out
}

/// Why `obj` blocks movement, if it does.
pub fn object_block(state: &SimulationState, obj: &WorldObject) -> Option<BlockReason> {
    if is_closeable_door_type(obj.type_id) {
        return if state.is_door_open(obj) {
            None
        } else {
            Some(BlockReason::ClosedDoor {
                type_id: obj.type_id,
            })
        };
    }
    if is_solid_env_type(obj.type_id) || is_furniture_object(obj) {
        return Some(BlockReason::Object {
            type_id: obj.type_id,
        });
    }
    None
}

/// Test whether the avatar may enter `dest`.
///
/// Blocking furniture is reported separately so the caller can turn the
/// bump into a pose interaction.
pub fn check_move(state: &SimulationState, world: &dyn WorldQuery, dest: Cell) -> MoveCheck {
    if world.terrain_blocked(dest) {
        return MoveCheck::Blocked(BlockReason::Terrain);
    }

    let covering = objects_covering(state, world, dest);
    if let Some(furniture) = covering
        .iter()
        .filter(|o| is_furniture_object(o))
        .max_by_key(|o| (o.order, o.index))
    {
        return MoveCheck::Furniture(*furniture);
    }
    if let Some(reason) = covering.iter().find_map(|o| object_block(state, o)) {
        return MoveCheck::Blocked(reason);
    }

    if let Some(entity) = world.entity_at(dest) {
        return MoveCheck::Blocked(BlockReason::Entity { id: entity.id });
    }

    MoveCheck::Clear
}

// =============================================================================
// TESTS
// =============================================================================
