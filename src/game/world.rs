//! World-layer collaborator interface.
//!
//! The simulation never embeds map formats or tile art. Collision, object
//! lookup and tile animation are answered by a [`WorldQuery`] implementation
//! supplied by the caller as pure, read-only queries.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::game::keys::Cell;

/// A world object as reported by the world layer.
///
/// Multi-tile objects are anchored at their bottom-right cell and spill
/// `footprint_w - 1` cells toward lower x and `footprint_h - 1` toward lower y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldObject {
    /// Anchor column
    pub x: i32,
    /// Anchor row
    pub y: i32,
    /// Level
    pub z: i32,
    /// Stacking order within the cell (higher is on top).
    pub order: u16,
    /// Object type (may carry bits above the base type)
    pub type_id: u16,
    /// Current frame as loaded
    pub frame: u8,
    /// Load index, used as the tie-breaker after `order`.
    pub index: u32,
    /// Width in cells
    pub footprint_w: u8,
    /// Height in cells
    pub footprint_h: u8,
}

impl WorldObject {
    /// Single-tile object at `(x, y, z)` with order 0.
    pub const fn new(x: i32, y: i32, z: i32, type_id: u16, frame: u8) -> Self {
        Self {
            x,
            y,
            z,
            order: 0,
            type_id,
            frame,
            index: 0,
            footprint_w: 1,
            footprint_h: 1,
        }
    }

    /// Set the stacking order.
    pub const fn with_order(mut self, order: u16) -> Self {
        self.order = order;
        self
    }

    /// Set a multi-tile footprint.
    pub const fn with_footprint(mut self, w: u8, h: u8) -> Self {
        self.footprint_w = w;
        self.footprint_h = h;
        self
    }

    /// The cell the object is anchored at.
    pub const fn anchor_cell(&self) -> Cell {
        Cell::new(self.x, self.y, self.z)
    }

    /// Whether this object's footprint covers `cell`.
    pub fn covers(&self, cell: Cell) -> bool {
        if cell.z != self.z {
            return false;
        }
        let w = i32::from(self.footprint_w.max(1));
        let h = i32::from(self.footprint_h.max(1));
        (self.x - w + 1..=self.x).contains(&cell.x) && (self.y - h + 1..=self.y).contains(&cell.y)
    }
}

/// A non-avatar occupant (NPC, creature) reported by the world layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// World-layer identifier
    pub id: u32,
}

/// Read-only world queries the simulation relies on.
pub trait WorldQuery {
    /// Terrain at `cell` is impassable.
    fn terrain_blocked(&self, cell: Cell) -> bool;

    /// Objects anchored at `cell`, in load order.
    fn objects_at(&self, cell: Cell) -> Vec<WorldObject>;

    /// Non-avatar occupant of `cell`, if any.
    fn entity_at(&self, cell: Cell) -> Option<EntityRef>;

    /// Static base tile at `cell`.
    fn base_tile(&self, cell: Cell) -> u16;

    /// Displayed tile for `base_tile` at `tick`.
    fn animated_tile(&self, tick: u32, base_tile: u16) -> u16;
}

/// Empty world: nothing blocks, no objects, no animation.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenWorld;

impl WorldQuery for OpenWorld {
    fn terrain_blocked(&self, _cell: Cell) -> bool {
        false
    }

    fn objects_at(&self, _cell: Cell) -> Vec<WorldObject> {
        Vec::new()
    }

    fn entity_at(&self, _cell: Cell) -> Option<EntityRef> {
        None
    }

    fn base_tile(&self, cell: Cell) -> u16 {
        synthetic_tile(cell)
    }

    fn animated_tile(&self, _tick: u32, base_tile: u16) -> u16 {
        base_tile
    }
}

/// Terrain tile used when no map data is loaded.
#[inline]
pub fn synthetic_tile(cell: Cell) -> u16 {
    (cell.x.wrapping_mul(7).wrapping_add(cell.y.wrapping_mul(13)) & 0xff) as u16
}

/// Frame cycle for an animated base tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileAnimation {
    /// Frame count (at least 1)
    pub frames: u16,
    /// Ticks each frame is shown (at least 1)
    pub ticks_per_frame: u32,
}

/// In-memory world layer for headless runs, benchmarks and tests.
#[derive(Clone, Debug, Default)]
pub struct StaticWorld {
    objects: BTreeMap<Cell, Vec<WorldObject>>,
    blocked: BTreeSet<Cell>,
    entities: BTreeMap<Cell, EntityRef>,
    tiles: BTreeMap<Cell, u16>,
    animations: BTreeMap<u16, TileAnimation>,
}

impl StaticWorld {
    /// Empty, fully passable world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object at its anchor cell. Assigns a load index when unset.
    pub fn add_object(&mut self, obj: WorldObject) -> &mut Self {
        let list = self.objects.entry(obj.anchor_cell()).or_default();
        let mut obj = obj;
        if obj.index == 0 {
            obj.index = list.len() as u32;
        }
        list.push(obj);
        self
    }

    /// Make `cell` impassable terrain.
    pub fn block(&mut self, cell: Cell) -> &mut Self {
        self.blocked.insert(cell);
        self
    }

    /// Place an entity.
    pub fn add_entity(&mut self, cell: Cell, id: u32) -> &mut Self {
        self.entities.insert(cell, EntityRef { id });
        self
    }

    /// Override the base tile drawn at `cell`.
    pub fn set_tile(&mut self, cell: Cell, tile: u16) -> &mut Self {
        self.tiles.insert(cell, tile);
        self
    }

    /// Animate `base_tile` through `frames` frames.
    pub fn animate(&mut self, base_tile: u16, frames: u16, ticks_per_frame: u32) -> &mut Self {
        self.animations.insert(
            base_tile,
            TileAnimation {
                frames: frames.max(1),
                ticks_per_frame: ticks_per_frame.max(1),
            },
        );
        self
    }

    /// A small furnished room around the documented start position.
    pub fn demo() -> Self {
        let mut world = Self::new();
        // Door two cells east of the start, wall cells north/south of it.
        world
            .add_object(WorldObject::new(0x135, 0x160, 0, 0x129, 4).with_order(1))
            .block(Cell::new(0x135, 0x15f, 0))
            .block(Cell::new(0x135, 0x161, 0))
            // Chair west, bed south-west (two tiles wide).
            .add_object(WorldObject::new(0x131, 0x160, 0, 0x0fc, 0))
            .add_object(WorldObject::new(0x132, 0x162, 0, 0x0a3, 0).with_footprint(2, 1))
            // Pickups north.
            .add_object(WorldObject::new(0x133, 0x15f, 0, 0x058, 0).with_order(2))
            .add_object(WorldObject::new(0x134, 0x15f, 0, 0x080, 1).with_order(3))
            .add_entity(Cell::new(0x133, 0x15d, 0), 7)
            .animate(0x10, 4, 2)
            .set_tile(Cell::new(0x130, 0x15e, 0), 0x10)
            .set_tile(Cell::new(0x136, 0x163, 0), 0x10);
        world
    }
}

impl WorldQuery for StaticWorld {
    fn terrain_blocked(&self, cell: Cell) -> bool {
        self.blocked.contains(&cell)
    }

    fn objects_at(&self, cell: Cell) -> Vec<WorldObject> {
        self.objects.get(&cell).cloned().unwrap_or_default()
    }

    fn entity_at(&self, cell: Cell) -> Option<EntityRef> {
        self.entities.get(&cell).copied()
    }

    fn base_tile(&self, cell: Cell) -> u16 {
        self.tiles
            .get(&cell)
            .copied()
            .unwrap_or_else(|| synthetic_tile(cell))
    }

    fn animated_tile(&self, tick: u32, base_tile: u16) -> u16 {
        match self.animations.get(&base_tile) {
            Some(anim) => {
                let phase = (tick / anim.ticks_per_frame) % u32::from(anim.frames);
                base_tile.wrapping_add(phase as u16)
            }
            None => base_tile,
        }
    }
}
