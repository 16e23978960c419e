//! Spatial and identity keys for the keyed sub-state-machines.
//!
//! Keys are structured values with a derived total order. Their canonical
//! text form (`Display`) is what the fingerprint folds and what snapshots
//! store, so `FromStr` must accept exactly what `Display` produces.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::game::world::WorldObject;

/// Map coordinate mask (x and y).
pub const COORD_MASK: i32 = 0x3ff;
/// Level mask (z).
pub const LEVEL_MASK: i32 = 0x0f;
/// Object type mask.
pub const TYPE_MASK: u16 = 0x03ff;
/// Item frame mask.
pub const FRAME_MASK: u8 = 0x3f;

/// Largest valid x/y coordinate.
pub const MAP_MAX: i32 = COORD_MASK;
/// Largest valid level.
pub const LEVEL_MAX: i32 = LEVEL_MASK;

/// A map cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
    /// Level
    pub z: i32,
}

impl Cell {
    /// Cell at `(x, y, z)`, unclamped.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Clamp into map bounds.
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0, MAP_MAX),
            y: self.y.clamp(0, MAP_MAX),
            z: self.z.clamp(0, LEVEL_MAX),
        }
    }

    /// Offset on the same level, clamped into map bounds.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z,
        }
        .clamped()
    }

    /// Chebyshev distance on the x/y plane.
    pub fn chebyshev(self, other: Cell) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.max(dy)
    }
}

fn parse_fields<const N: usize>(s: &str, what: &'static str) -> Result<[i64; N], KeyParseError> {
    let mut out = [0i64; N];
    let mut parts = s.split(',');
    for slot in out.iter_mut() {
        let part = parts.next().ok_or(KeyParseError(what))?;
        *slot = part.parse().map_err(|_| KeyParseError(what))?;
    }
    if parts.next().is_some() {
        return Err(KeyParseError(what));
    }
    Ok(out)
}

fn in_range(v: i64, mask: i64, what: &'static str) -> Result<i64, KeyParseError> {
    if (0..=mask).contains(&v) {
        Ok(v)
    } else {
        Err(KeyParseError(what))
    }
}

/// Error parsing a canonical key string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed {0} key")]
pub struct KeyParseError(&'static str);

macro_rules! text_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

// =============================================================================
// DOOR KEY
// =============================================================================

/// Identity of a door instance: position plus stacking order.
///
/// Canonical text: `x,y,z,order`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DoorKey {
    x: u16,
    y: u16,
    z: u8,
    order: u16,
}

impl DoorKey {
    /// Key for the door at `(x, y, z)` with stacking `order`. Out-of-range
    /// coordinates are masked.
    pub fn new(x: i32, y: i32, z: i32, order: u16) -> Self {
        Self {
            x: (x & COORD_MASK) as u16,
            y: (y & COORD_MASK) as u16,
            z: (z & LEVEL_MASK) as u8,
            order,
        }
    }

    /// Key of a door object.
    pub fn of(obj: &WorldObject) -> Self {
        Self::new(obj.x, obj.y, obj.z, obj.order)
    }
}

impl fmt::Display for DoorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.z, self.order)
    }
}

impl FromStr for DoorKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const WHAT: &str = "door";
        let [x, y, z, order] = parse_fields::<4>(s, WHAT)?;
        Ok(Self {
            x: in_range(x, COORD_MASK as i64, WHAT)? as u16,
            y: in_range(y, COORD_MASK as i64, WHAT)? as u16,
            z: in_range(z, LEVEL_MASK as i64, WHAT)? as u8,
            order: in_range(order, u16::MAX as i64, WHAT)? as u16,
        })
    }
}

text_serde!(DoorKey);

// =============================================================================
// OBJECT ANCHOR
// =============================================================================

/// Identity of a specific world object instance: position, order and type.
///
/// Used for removal/respawn tracking and as the pose back-reference.
/// Canonical text: `x,y,z,order,type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectAnchor {
    /// Anchor column
    pub x: u16,
    /// Anchor row
    pub y: u16,
    /// Level
    pub z: u8,
    /// Stacking order within the cell
    pub order: u16,
    /// Base object type
    pub type_id: u16,
}

impl ObjectAnchor {
    /// Anchor from raw parts, masked into range.
    pub fn new(x: i32, y: i32, z: i32, order: u16, type_id: u16) -> Self {
        Self {
            x: (x & COORD_MASK) as u16,
            y: (y & COORD_MASK) as u16,
            z: (z & LEVEL_MASK) as u8,
            order,
            type_id: type_id & TYPE_MASK,
        }
    }

    /// Anchor of a world object instance.
    pub fn of(obj: &WorldObject) -> Self {
        Self::new(obj.x, obj.y, obj.z, obj.order, obj.type_id)
    }

    /// The anchor cell.
    pub fn cell(&self) -> Cell {
        Cell::new(i32::from(self.x), i32::from(self.y), i32::from(self.z))
    }
}

impl fmt::Display for ObjectAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.x, self.y, self.z, self.order, self.type_id
        )
    }
}

impl FromStr for ObjectAnchor {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const WHAT: &str = "object anchor";
        let [x, y, z, order, type_id] = parse_fields::<5>(s, WHAT)?;
        Ok(Self {
            x: in_range(x, COORD_MASK as i64, WHAT)? as u16,
            y: in_range(y, COORD_MASK as i64, WHAT)? as u16,
            z: in_range(z, LEVEL_MASK as i64, WHAT)? as u8,
            order: in_range(order, u16::MAX as i64, WHAT)? as u16,
            type_id: in_range(type_id, TYPE_MASK as i64, WHAT)? as u16,
        })
    }
}

text_serde!(ObjectAnchor);

// =============================================================================
// ITEM KEY
// =============================================================================

/// Inventory stack identity: object type and frame.
///
/// Canonical text: `0xTTT:0xFF` (lowercase, zero padded).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey {
    /// Object type (10 bits)
    pub type_id: u16,
    /// Frame (6 bits)
    pub frame: u8,
}

impl ItemKey {
    /// Key for `type_id` / `frame`, masked into range.
    pub fn new(type_id: u16, frame: u8) -> Self {
        Self {
            type_id: type_id & TYPE_MASK,
            frame: frame & FRAME_MASK,
        }
    }

    /// Stack a picked-up object lands in.
    pub fn of(obj: &WorldObject) -> Self {
        Self::new(obj.type_id, obj.frame)
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:03x}:0x{:02x}", self.type_id, self.frame)
    }
}

impl FromStr for ItemKey {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const WHAT: &str = "item";
        let (t, fr) = s.split_once(':').ok_or(KeyParseError(WHAT))?;
        let t = t.strip_prefix("0x").ok_or(KeyParseError(WHAT))?;
        let fr = fr.strip_prefix("0x").ok_or(KeyParseError(WHAT))?;
        if t.len() != 3 || fr.len() != 2 {
            return Err(KeyParseError(WHAT));
        }
        let type_id = u16::from_str_radix(t, 16).map_err(|_| KeyParseError(WHAT))?;
        let frame = u8::from_str_radix(fr, 16).map_err(|_| KeyParseError(WHAT))?;
        if type_id > TYPE_MASK || frame > FRAME_MASK {
            return Err(KeyParseError(WHAT));
        }
        Ok(Self { type_id, frame })
    }
}

text_serde!(ItemKey);

// =============================================================================
// TESTS
// =============================================================================
