//! Door open/closed state.
//!
//! A door's stored frame is its default. Toggling records the door key in
//! `door_open_states`; a toggled door renders `frame ^ mask` and its
//! passability follows the resolved frame.

use crate::game::keys::DoorKey;
use crate::game::objects::{door_toggle_mask, is_closeable_door_type, is_door_frame_open};
use crate::game::state::SimulationState;
use crate::game::world::WorldObject;

impl SimulationState {
    /// Whether `obj` is a closeable door that has been toggled.
    pub fn is_door_toggled_obj(&self, obj: &WorldObject) -> bool {
        is_closeable_door_type(obj.type_id) && self.is_door_toggled(&DoorKey::of(obj))
    }

    /// Flip a closeable door. Returns the new toggled flag, or `None` when
    /// `obj` is not a closeable door.
    pub fn toggle_door(&mut self, obj: &WorldObject) -> Option<bool> {
        if !is_closeable_door_type(obj.type_id) {
            return None;
        }
        let key = DoorKey::of(obj);
        if self.door_open_states.remove(&key) {
            Some(false)
        } else {
            self.door_open_states.insert(key);
            Some(true)
        }
    }

    /// Frame the door is currently displayed with.
    pub fn resolved_door_frame(&self, obj: &WorldObject) -> u8 {
        if self.is_door_toggled_obj(obj) {
            obj.frame ^ door_toggle_mask(obj.type_id)
        } else {
            obj.frame
        }
    }

    /// Whether the door is currently open (passable).
    pub fn is_door_open(&self, obj: &WorldObject) -> bool {
        is_door_frame_open(obj.type_id, self.resolved_door_frame(obj))
    }
}
