//! Simulation State Definitions
//!
//! The single mutable aggregate advanced by the tick stepper.
//! Uses BTreeMap/BTreeSet for deterministic iteration order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::hash::{Fingerprint, StateHasher};
use crate::core::rng::SimRng;
use crate::game::clock::{DAYS_PER_MONTH, HOURS_PER_DAY, MINUTES_PER_HOUR, MONTHS_PER_YEAR};
use crate::game::keys::{Cell, DoorKey, ItemKey, ObjectAnchor, LEVEL_MAX, MAP_MAX};

/// Start column.
pub const START_X: i32 = 0x133;
/// Start row.
pub const START_Y: i32 = 0x160;
/// Start level.
pub const START_Z: i32 = 0;

/// Default PRNG seed.
pub const DEFAULT_SEED: u32 = 0x1234;

// =============================================================================
// WORLD
// =============================================================================

/// Avatar position, calendar and miscellaneous world scalars.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldState {
    /// Quest flag
    pub is_on_quest: u32,
    /// Earliest time the party may sleep again
    pub next_sleep: u32,
    /// Minute of hour (0-59)
    pub minute: u32,
    /// Hour of day (0-23)
    pub hour: u32,
    /// Day of month (1-28)
    pub day: u32,
    /// Month of year (1-13)
    pub month: u32,
    /// Year, wraps
    pub year: u32,
    /// Wind direction
    pub wind_dir: i32,
    /// Active party member slot
    pub active_member: u32,
    /// Avatar column
    pub map_x: i32,
    /// Avatar row
    pub map_y: i32,
    /// Avatar level
    pub map_z: i32,
    /// Combat mode flag
    pub in_combat: bool,
    /// Sound toggle
    pub sound_enabled: bool,
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            is_on_quest: 0,
            next_sleep: 0,
            minute: 12,
            hour: 8,
            day: 4,
            month: 7,
            year: 161,
            wind_dir: 0,
            active_member: 0,
            map_x: START_X,
            map_y: START_Y,
            map_z: START_Z,
            in_combat: false,
            sound_enabled: true,
        }
    }
}

impl WorldState {
    /// Avatar cell.
    pub fn avatar_cell(&self) -> Cell {
        Cell::new(self.map_x, self.map_y, self.map_z)
    }

    /// Move the avatar, clamped into map bounds.
    pub fn set_avatar_cell(&mut self, cell: Cell) {
        let cell = cell.clamped();
        self.map_x = cell.x;
        self.map_y = cell.y;
        self.map_z = cell.z;
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.is_on_quest);
        hasher.update_u32(self.next_sleep);
        hasher.update_u32(self.minute);
        hasher.update_u32(self.hour);
        hasher.update_u32(self.day);
        hasher.update_u32(self.month);
        hasher.update_u32(self.year);
        hasher.update_i32(self.wind_dir);
        hasher.update_u32(self.active_member);
        hasher.update_i32(self.map_x);
        hasher.update_i32(self.map_y);
        hasher.update_i32(self.map_z);
        hasher.update_bool(self.in_combat);
        hasher.update_bool(self.sound_enabled);
    }
}

// =============================================================================
// AVATAR POSE
// =============================================================================

/// Avatar posture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum AvatarPose {
    /// Free to move
    #[default]
    Stand = 0,
    /// On a chair
    Sit = 1,
    /// On a bed
    Sleep = 2,
}

impl AvatarPose {
    /// Ordinal folded into the fingerprint.
    #[inline]
    pub fn ordinal(self) -> u32 {
        self as u32
    }
}

// =============================================================================
// SPAWNED OBJECTS
// =============================================================================

/// A dynamically created world object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedObject {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
    /// Level
    pub z: i32,
    /// Object type
    pub type_id: u16,
    /// Frame
    pub frame: u8,
    /// Stacking order
    pub order: u16,
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Structural problems found in a state (usually a decoded snapshot).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidState {
    /// The PRNG would be stuck at zero
    #[error("rng state is zero")]
    ZeroRng,
    /// A calendar or position field is outside its range
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
    /// Inventory holds an empty stack
    #[error("inventory entry {0} has zero count")]
    ZeroInventory(ItemKey),
    /// `removed_object_count` is stale
    #[error("removed object count {cached} does not match {actual} entries")]
    RemovedCountMismatch { cached: u32, actual: usize },
    /// Standing with an anchor, or posed without one
    #[error("pose {pose:?} inconsistent with anchor presence")]
    PoseAnchorMismatch { pose: AvatarPose },
}

// =============================================================================
// SIMULATION STATE
// =============================================================================

/// Complete simulation state.
///
/// Exclusively owned by the caller; the stepper borrows it for one call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Current tick (wraps at 2^32)
    pub tick: u32,

    /// PRNG state, never zero
    #[serde(rename = "rng_state")]
    pub rng: SimRng,

    /// Scratch bitfield mixed with one PRNG bit per tick
    pub world_flags: u32,

    /// Commands successfully dispatched
    pub commands_applied: u32,

    /// Doors whose open/closed state is toggled from default
    pub door_open_states: BTreeSet<DoorKey>,

    /// Removed world objects and the tick they were removed at
    pub removed_objects: BTreeMap<ObjectAnchor, u32>,

    /// Cached number of live removal entries
    pub removed_object_count: u32,

    /// Carried items, count always positive
    pub inventory: BTreeMap<ItemKey, u32>,

    /// Objects created at runtime, in creation order
    pub spawned_world_objects: Vec<SpawnedObject>,
    /// Sequence number for the next spawned object
    pub spawned_world_seq: u32,

    /// Current posture
    pub avatar_pose: AvatarPose,

    /// Tick the pose was last set at
    pub avatar_pose_set_tick: u32,

    /// Furniture the pose is anchored to (back-reference only)
    pub avatar_pose_anchor: Option<ObjectAnchor>,

    /// Calendar, position and world scalars
    pub world: WorldState,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new(DEFAULT_SEED, WorldState::default())
    }
}

impl SimulationState {
    /// Create a fresh state at tick 0.
    pub fn new(seed: u32, world: WorldState) -> Self {
        Self {
            tick: 0,
            rng: SimRng::new(seed),
            world_flags: 0,
            commands_applied: 0,
            door_open_states: BTreeSet::new(),
            removed_objects: BTreeMap::new(),
            removed_object_count: 0,
            inventory: BTreeMap::new(),
            spawned_world_objects: Vec::new(),
            spawned_world_seq: 0,
            avatar_pose: AvatarPose::Stand,
            avatar_pose_set_tick: 0,
            avatar_pose_anchor: None,
            world,
        }
    }

    /// Is the object with this anchor currently removed?
    pub fn is_removed(&self, anchor: &ObjectAnchor) -> bool {
        self.removed_objects.contains_key(anchor)
    }

    /// Is the door with this key toggled away from its default frame?
    pub fn is_door_toggled(&self, key: &DoorKey) -> bool {
        self.door_open_states.contains(key)
    }

    /// Count of an inventory item (0 when absent).
    pub fn item_count(&self, key: &ItemKey) -> u32 {
        self.inventory.get(key).copied().unwrap_or(0)
    }

    /// Compute the 64-bit state fingerprint.
    ///
    /// Keyed maps fold in sorted canonical-text order, one character at a
    /// time, so the result does not depend on insertion order.
    pub fn compute_fingerprint(&self) -> Fingerprint {
        let mut h = StateHasher::new();

        h.update_u32(self.tick);
        h.update_u32(self.rng.state());
        h.update_u32(self.world_flags);
        h.update_u32(self.commands_applied);
        self.world.hash_into(&mut h);

        h.update_u32(self.avatar_pose.ordinal());
        match &self.avatar_pose_anchor {
            Some(anchor) => {
                h.update_u32(1);
                h.update_u32(u32::from(anchor.x));
                h.update_u32(u32::from(anchor.y));
                h.update_u32(u32::from(anchor.z));
                h.update_u32(u32::from(anchor.order));
                h.update_u32(u32::from(anchor.type_id));
            }
            None => h.update_u32(0),
        }

        // Doors
        let doors = sorted_text(self.door_open_states.iter().map(|k| (k.to_string(), ())));
        h.update_len(doors.len());
        for (key, ()) in &doors {
            h.update_str(key);
            h.update_u32(1);
        }

        // Removed objects: keys with their flag, then removal ticks
        let removed = sorted_text(
            self.removed_objects
                .iter()
                .map(|(k, tick)| (k.to_string(), *tick)),
        );
        h.update_len(removed.len());
        for (key, _) in &removed {
            h.update_str(key);
            h.update_u32(1);
        }
        h.update_len(removed.len());
        for (_, tick) in &removed {
            h.update_u32(*tick);
        }
        h.update_u32(self.removed_object_count);

        // Inventory
        let items = sorted_text(self.inventory.iter().map(|(k, n)| (k.to_string(), *n)));
        h.update_len(items.len());
        for (key, count) in &items {
            h.update_str(key);
            h.update_u32(*count);
        }

        // Spawned objects (sequence order is state)
        h.update_len(self.spawned_world_objects.len());
        for o in &self.spawned_world_objects {
            h.update_i32(o.x);
            h.update_i32(o.y);
            h.update_i32(o.z);
            h.update_u32(u32::from(o.type_id));
            h.update_u32(u32::from(o.frame));
            h.update_u32(u32::from(o.order));
        }
        h.update_u32(self.spawned_world_seq);

        h.finalize()
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), InvalidState> {
        if self.rng.state() == 0 {
            return Err(InvalidState::ZeroRng);
        }

        let w = &self.world;
        check_range("minute", i64::from(w.minute), 0, i64::from(MINUTES_PER_HOUR) - 1)?;
        check_range("hour", i64::from(w.hour), 0, i64::from(HOURS_PER_DAY) - 1)?;
        check_range("day", i64::from(w.day), 1, i64::from(DAYS_PER_MONTH))?;
        check_range("month", i64::from(w.month), 1, i64::from(MONTHS_PER_YEAR))?;
        check_range("map_x", i64::from(w.map_x), 0, i64::from(MAP_MAX))?;
        check_range("map_y", i64::from(w.map_y), 0, i64::from(MAP_MAX))?;
        check_range("map_z", i64::from(w.map_z), 0, i64::from(LEVEL_MAX))?;

        if let Some((key, _)) = self.inventory.iter().find(|(_, n)| **n == 0) {
            return Err(InvalidState::ZeroInventory(*key));
        }

        if self.removed_object_count as usize != self.removed_objects.len() {
            return Err(InvalidState::RemovedCountMismatch {
                cached: self.removed_object_count,
                actual: self.removed_objects.len(),
            });
        }

        let anchored = self.avatar_pose_anchor.is_some();
        if (self.avatar_pose == AvatarPose::Stand) == anchored {
            return Err(InvalidState::PoseAnchorMismatch {
                pose: self.avatar_pose,
            });
        }

        Ok(())
    }
}

fn check_range(field: &'static str, value: i64, lo: i64, hi: i64) -> Result<(), InvalidState> {
    if (lo..=hi).contains(&value) {
        Ok(())
    } else {
        Err(InvalidState::OutOfRange { field, value })
    }
}

/// Collect `(canonical text, value)` pairs sorted by text.
fn sorted_text<V>(entries: impl Iterator<Item = (String, V)>) -> Vec<(String, V)> {
    let mut out: Vec<(String, V)> = entries.collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

// =============================================================================
// TESTS
// =============================================================================
