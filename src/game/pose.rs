//! Avatar pose transitions (stand, sit, sleep).

use crate::game::keys::{Cell, ObjectAnchor};
use crate::game::objects::{is_bed_object, is_chair_object};
use crate::game::state::{AvatarPose, SimulationState};
use crate::game::world::WorldObject;

/// Pose a piece of furniture puts the avatar into.
pub fn pose_for_furniture(obj: &WorldObject) -> Option<AvatarPose> {
    if is_chair_object(obj) {
        Some(AvatarPose::Sit)
    } else if is_bed_object(obj) {
        Some(AvatarPose::Sleep)
    } else {
        None
    }
}

/// A pose change applied to the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoseChange {
    /// Pose before
    pub from: AvatarPose,
    /// Pose after
    pub to: AvatarPose,
    /// Furniture the avatar is now on, if any
    pub anchor: Option<ObjectAnchor>,
}

impl SimulationState {
    /// Interact with furniture at tick `at_tick`.
    ///
    /// Using the piece the avatar is already posed on stands it up.
    /// Otherwise the avatar snaps to the anchor cell and takes the pose.
    pub fn interact_furniture(&mut self, obj: &WorldObject, at_tick: u32) -> Option<PoseChange> {
        let pose = pose_for_furniture(obj)?;
        let anchor = ObjectAnchor::of(obj);
        let from = self.avatar_pose;

        if self.avatar_pose_anchor == Some(anchor) {
            self.stand_up(at_tick);
            return Some(PoseChange {
                from,
                to: AvatarPose::Stand,
                anchor: None,
            });
        }

        self.avatar_pose = pose;
        self.avatar_pose_anchor = Some(anchor);
        self.avatar_pose_set_tick = at_tick;
        self.world.set_avatar_cell(obj.anchor_cell());

        Some(PoseChange {
            from,
            to: pose,
            anchor: Some(anchor),
        })
    }

    /// Return to standing. No-op when already standing.
    pub fn stand_up(&mut self, at_tick: u32) -> bool {
        if self.avatar_pose == AvatarPose::Stand {
            return false;
        }
        self.avatar_pose = AvatarPose::Stand;
        self.avatar_pose_anchor = None;
        self.avatar_pose_set_tick = at_tick;
        true
    }

    /// Whether a pose was set at `tick`.
    pub fn pose_set_at(&self, tick: u32) -> bool {
        self.avatar_pose != AvatarPose::Stand && self.avatar_pose_set_tick == tick
    }

    /// Cell the avatar is anchored to, if posed.
    pub fn pose_cell(&self) -> Option<Cell> {
        self.avatar_pose_anchor.map(|a| a.cell())
    }
}
