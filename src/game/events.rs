//! Simulation Events
//!
//! Emitted by the stepper for presentation layers and logs. Events are not
//! part of state and are never fingerprinted.

use serde::{Deserialize, Serialize};

use crate::game::collision::BlockReason;
use crate::game::command::CommandKind;
use crate::game::keys::{Cell, DoorKey, ItemKey, ObjectAnchor};
use crate::game::state::AvatarPose;

/// Why a command was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Target cell beyond the verb's range
    OutOfRange,
    /// Nothing at the target to act on
    NoTarget,
    /// Move arrived on the tick a pose was set
    PoseJustSet,
    /// Drop with an empty inventory
    EmptyInventory,
    /// Move superseded by a pose interaction this tick
    Superseded,
}

/// Something that happened during a step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum SimEvent {
    /// Avatar stepped to a new cell
    AvatarMoved {
        from: Cell,
        to: Cell,
    },
    /// A move was stopped (still counted as applied)
    MoveBlocked {
        at: Cell,
        reason: BlockReason,
    },
    /// Door frame flipped
    DoorToggled {
        door: DoorKey,
        open: bool,
    },
    /// Stand/sit/sleep transition
    PoseChanged {
        from: AvatarPose,
        to: AvatarPose,
        anchor: Option<ObjectAnchor>,
    },
    /// Look resolved the top object, if any
    ObjectLooked {
        at: Cell,
        type_id: Option<u16>,
    },
    /// Talk reached an entity
    TalkedTo {
        at: Cell,
        entity: u32,
    },
    /// Pickup moved into the inventory
    ItemTaken {
        item: ItemKey,
        from: ObjectAnchor,
        count: u32,
    },
    /// One unit left the inventory
    ItemDropped {
        item: ItemKey,
        at: Cell,
        remaining: u32,
    },
    /// Accepted verb with no resolution model (attack, cast, move-at-cell)
    PolicyStub {
        kind: CommandKind,
        at: Cell,
    },
    /// Command not applied
    CommandRejected {
        kind: CommandKind,
        reason: RejectReason,
    },
    /// A removed object is available again
    ObjectRespawned {
        anchor: ObjectAnchor,
    },
    /// Local clock ticked over
    MinuteAdvanced {
        hour: u32,
        minute: u32,
    },
}

impl SimEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            SimEvent::AvatarMoved { .. } => "avatar_moved",
            SimEvent::MoveBlocked { .. } => "move_blocked",
            SimEvent::DoorToggled { .. } => "door_toggled",
            SimEvent::PoseChanged { .. } => "pose_changed",
            SimEvent::ObjectLooked { .. } => "object_looked",
            SimEvent::TalkedTo { .. } => "talked_to",
            SimEvent::ItemTaken { .. } => "item_taken",
            SimEvent::ItemDropped { .. } => "item_dropped",
            SimEvent::PolicyStub { .. } => "policy_stub",
            SimEvent::CommandRejected { .. } => "command_rejected",
            SimEvent::ObjectRespawned { .. } => "object_respawned",
            SimEvent::MinuteAdvanced { .. } => "minute_advanced",
        }
    }
}
