//! Object type classification.
//!
//! Game rules only: which object types are doors, furniture, solid scenery
//! or pickup-eligible. No tile art lives here.

use crate::game::keys::TYPE_MASK;
use crate::game::world::WorldObject;

const DOOR_TYPES: [u16; 7] = [0x10f, 0x129, 0x12a, 0x12b, 0x12c, 0x12d, 0x14e];
const CLOSEABLE_DOOR_TYPES: [u16; 5] = [0x129, 0x12a, 0x12b, 0x12c, 0x14e];
const CHAIR_TYPES: [u16; 1] = [0x0fc];
const BED_TYPES: [u16; 1] = [0x0a3];
const TOP_DECOR_TYPES: [u16; 8] = [0x05f, 0x060, 0x080, 0x081, 0x084, 0x07a, 0x0d1, 0x0ea];
const SOLID_ENV_TYPES: [u16; 15] = [
    0x0a3, 0x0a4, 0x0b0, 0x0b1, 0x0c6, 0x0d8, 0x0d9, 0x0e4, 0x0e6, 0x0ed, 0x0ef, 0x0fa, 0x117,
    0x137, 0x147,
];

/// Type with a chair frame variant (bench-like object whose frame 2 seats).
const SEAT_VARIANT_TYPE: u16 = 0x147;
const SEAT_VARIANT_FRAME: u8 = 2;

/// Portcullis-style door whose open state lives in the low frame bit.
const LOW_BIT_DOOR_TYPE: u16 = 0x14e;

#[inline]
fn base_type(type_id: u16) -> u16 {
    type_id & TYPE_MASK
}

/// Any door, closeable or not.
pub fn is_door_type(type_id: u16) -> bool {
    DOOR_TYPES.contains(&base_type(type_id))
}

/// Doors the avatar can open and close.
pub fn is_closeable_door_type(type_id: u16) -> bool {
    CLOSEABLE_DOOR_TYPES.contains(&base_type(type_id))
}

/// Chairs.
pub fn is_chair_type(type_id: u16) -> bool {
    CHAIR_TYPES.contains(&base_type(type_id))
}

/// Beds.
pub fn is_bed_type(type_id: u16) -> bool {
    BED_TYPES.contains(&base_type(type_id))
}

/// Scenery that blocks movement.
pub fn is_solid_env_type(type_id: u16) -> bool {
    SOLID_ENV_TYPES.contains(&base_type(type_id))
}

/// Decoration drawn on top; never picked up.
pub fn is_top_decor_type(type_id: u16) -> bool {
    TOP_DECOR_TYPES.contains(&base_type(type_id))
}

/// Chair check that also accepts the seat variant frame.
pub fn is_chair_object(obj: &WorldObject) -> bool {
    let t = base_type(obj.type_id);
    is_chair_type(t) || (t == SEAT_VARIANT_TYPE && obj.frame == SEAT_VARIANT_FRAME)
}

/// Bed check on an instance.
pub fn is_bed_object(obj: &WorldObject) -> bool {
    is_bed_type(obj.type_id)
}

/// Furniture the avatar can sit or sleep on.
pub fn is_furniture_object(obj: &WorldObject) -> bool {
    is_chair_object(obj) || is_bed_object(obj)
}

/// Anything that is not a door, furniture, solid scenery or decoration.
pub fn is_pickup_type(type_id: u16) -> bool {
    !(is_door_type(type_id)
        || is_chair_type(type_id)
        || is_bed_type(type_id)
        || is_solid_env_type(type_id)
        || is_top_decor_type(type_id))
}

/// Frame bits flipped when a closeable door is toggled.
pub fn door_toggle_mask(type_id: u16) -> u8 {
    if base_type(type_id) == LOW_BIT_DOOR_TYPE {
        1
    } else {
        4
    }
}

/// Whether a closeable door frame shows the door open.
pub fn is_door_frame_open(type_id: u16, frame: u8) -> bool {
    if !is_closeable_door_type(type_id) {
        return false;
    }
    if base_type(type_id) == LOW_BIT_DOOR_TYPE {
        frame & 1 != 0
    } else {
        frame < 4
    }
}
