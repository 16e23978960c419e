//! Command Dispatch
//!
//! One handler per [`CommandKind`]. Handlers run to completion, never fail,
//! and clamp or reject bad arguments instead of raising errors.

use serde::{Deserialize, Serialize};

use crate::game::collision::{check_move, objects_covering, top_object_at, MoveCheck};
use crate::game::command::{Command, CommandKind};
use crate::game::events::{RejectReason, SimEvent};
use crate::game::keys::{Cell, DoorKey, ItemKey, ObjectAnchor};
use crate::game::objects::{is_closeable_door_type, is_furniture_object, is_pickup_type};
use crate::game::state::SimulationState;
use crate::game::world::{WorldObject, WorldQuery};

// =============================================================================
// VERB RANGES (Chebyshev distance from the avatar)
// =============================================================================

/// Use and use-verb reach.
pub const USE_RANGE: u32 = 1;
/// Talk reach.
pub const TALK_RANGE: u32 = 1;
/// Pickup reach.
pub const GET_RANGE: u32 = 1;
/// Targeted move reach.
pub const MOVE_AT_RANGE: u32 = 1;
/// Drop reach.
pub const DROP_RANGE: u32 = 2;
/// Look reach.
pub const LOOK_RANGE: u32 = 5;
/// Attack reach.
pub const ATTACK_RANGE: u32 = 5;
/// Cast reach.
pub const CAST_RANGE: u32 = 5;

/// Maximum range of an absolute-cell verb. `None` for relative kinds.
pub const fn verb_range(kind: CommandKind) -> Option<u32> {
    match kind {
        CommandKind::MoveAvatar | CommandKind::UseFacing => None,
        CommandKind::UseAtCell | CommandKind::UseVerbAtCell => Some(USE_RANGE),
        CommandKind::LookAtCell => Some(LOOK_RANGE),
        CommandKind::TalkAtCell => Some(TALK_RANGE),
        CommandKind::GetAtCell => Some(GET_RANGE),
        CommandKind::AttackAtCell => Some(ATTACK_RANGE),
        CommandKind::CastAtCell => Some(CAST_RANGE),
        CommandKind::DropAtCell => Some(DROP_RANGE),
        CommandKind::MoveAtCell => Some(MOVE_AT_RANGE),
    }
}

/// Interaction policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    /// Free movement: no collision, no range gating.
    Ghost,
    /// Collision-checked movement with range-gated verbs.
    #[default]
    Avatar,
}

/// Result of dispatching one command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Took effect (or was a counted no-op)
    Applied,
    /// Applied, and it set or cleared a furniture pose
    PoseInteraction,
    /// Not applied and not counted
    Rejected(RejectReason),
}

impl Outcome {
    /// Whether the command counts toward `commands_applied`.
    #[inline]
    pub fn is_applied(self) -> bool {
        !matches!(self, Outcome::Rejected(_))
    }
}

/// Everything a handler may read besides the state.
#[derive(Clone, Copy)]
pub struct DispatchContext<'a> {
    /// World-layer queries
    pub world: &'a dyn WorldQuery,
    /// Ghost or avatar policy
    pub mode: InteractionMode,
    /// Tick being applied
    pub tick: u32,
}

/// Apply one command to `state`.
pub fn dispatch(
    state: &mut SimulationState,
    cmd: &Command,
    ctx: &DispatchContext<'_>,
    events: &mut Vec<SimEvent>,
) -> Outcome {
    let outcome = match cmd.kind {
        CommandKind::MoveAvatar => move_avatar(state, cmd.arg0, cmd.arg1, ctx, events),
        CommandKind::UseFacing => {
            let target = state
                .world
                .avatar_cell()
                .offset(cmd.arg0.signum(), cmd.arg1.signum());
            use_cell(state, target, ctx, events)
        }
        CommandKind::UseAtCell | CommandKind::UseVerbAtCell => {
            ranged(state, cmd, ctx, events, use_cell)
        }
        CommandKind::LookAtCell => ranged(state, cmd, ctx, events, look),
        CommandKind::TalkAtCell => ranged(state, cmd, ctx, events, talk),
        CommandKind::GetAtCell => ranged(state, cmd, ctx, events, get),
        CommandKind::DropAtCell => ranged(state, cmd, ctx, events, drop_item),
        kind @ (CommandKind::AttackAtCell | CommandKind::CastAtCell | CommandKind::MoveAtCell) => {
            ranged(state, cmd, ctx, events, |_, target, _, events| {
                events.push(SimEvent::PolicyStub { kind, at: target });
                Outcome::Applied
            })
        }
    };

    match outcome {
        Outcome::Rejected(reason) => {
            events.push(SimEvent::CommandRejected {
                kind: cmd.kind,
                reason,
            });
        }
        _ => state.commands_applied = state.commands_applied.wrapping_add(1),
    }

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(tick = ctx.tick, ?cmd, ?outcome, "dispatched");

    outcome
}

/// Absolute target cell on the avatar's level, clamped into the map.
fn target_cell(state: &SimulationState, cmd: &Command) -> Cell {
    Cell::new(cmd.arg0, cmd.arg1, state.world.map_z).clamped()
}

fn in_range(state: &SimulationState, kind: CommandKind, target: Cell, mode: InteractionMode) -> bool {
    if mode == InteractionMode::Ghost {
        return true;
    }
    match verb_range(kind) {
        Some(range) => state.world.avatar_cell().chebyshev(target) <= range,
        None => true,
    }
}

/// Resolve the absolute target and run `handler` if it is in range.
fn ranged<F>(
    state: &mut SimulationState,
    cmd: &Command,
    ctx: &DispatchContext<'_>,
    events: &mut Vec<SimEvent>,
    handler: F,
) -> Outcome
where
    F: FnOnce(&mut SimulationState, Cell, &DispatchContext<'_>, &mut Vec<SimEvent>) -> Outcome,
{
    let target = target_cell(state, cmd);
    if !in_range(state, cmd.kind, target, ctx.mode) {
        return Outcome::Rejected(RejectReason::OutOfRange);
    }
    handler(state, target, ctx, events)
}

// =============================================================================
// HANDLERS
// =============================================================================

fn move_avatar(
    state: &mut SimulationState,
    dx: i32,
    dy: i32,
    ctx: &DispatchContext<'_>,
    events: &mut Vec<SimEvent>,
) -> Outcome {
    if state.pose_set_at(ctx.tick) {
        return Outcome::Rejected(RejectReason::PoseJustSet);
    }

    let from_pose = state.avatar_pose;
    if state.stand_up(ctx.tick) {
        events.push(SimEvent::PoseChanged {
            from: from_pose,
            to: state.avatar_pose,
            anchor: None,
        });
    }

    let from = state.world.avatar_cell();
    let dest = from.offset(dx.signum(), dy.signum());
    if dest == from {
        return Outcome::Applied;
    }

    if ctx.mode == InteractionMode::Avatar {
        match check_move(state, ctx.world, dest) {
            MoveCheck::Clear => {}
            MoveCheck::Furniture(obj) => return pose_interaction(state, &obj, ctx, events),
            MoveCheck::Blocked(reason) => {
                events.push(SimEvent::MoveBlocked { at: dest, reason });
                return Outcome::Applied;
            }
        }
    }

    state.world.set_avatar_cell(dest);
    events.push(SimEvent::AvatarMoved { from, to: dest });
    Outcome::Applied
}

fn pose_interaction(
    state: &mut SimulationState,
    obj: &WorldObject,
    ctx: &DispatchContext<'_>,
    events: &mut Vec<SimEvent>,
) -> Outcome {
    match state.interact_furniture(obj, ctx.tick) {
        Some(change) => {
            events.push(SimEvent::PoseChanged {
                from: change.from,
                to: change.to,
                anchor: change.anchor,
            });
            Outcome::PoseInteraction
        }
        None => Outcome::Rejected(RejectReason::NoTarget),
    }
}

/// Doors first, then furniture.
fn use_cell(
    state: &mut SimulationState,
    target: Cell,
    ctx: &DispatchContext<'_>,
    events: &mut Vec<SimEvent>,
) -> Outcome {
    if let Some(door) = top_object_at(state, ctx.world, target, |o| is_closeable_door_type(o.type_id)) {
        if state.toggle_door(&door).is_some() {
            events.push(SimEvent::DoorToggled {
                door: DoorKey::of(&door),
                open: state.is_door_open(&door),
            });
            return Outcome::Applied;
        }
    }

    let furniture = objects_covering(state, ctx.world, target)
        .into_iter()
        .filter(is_furniture_object)
        .max_by_key(|o| (o.order, o.index));
    match furniture {
        Some(obj) => pose_interaction(state, &obj, ctx, events),
        None => Outcome::Rejected(RejectReason::NoTarget),
    }
}

fn look(
    state: &mut SimulationState,
    target: Cell,
    ctx: &DispatchContext<'_>,
    events: &mut Vec<SimEvent>,
) -> Outcome {
    let top = top_object_at(state, ctx.world, target, |_| true);
    events.push(SimEvent::ObjectLooked {
        at: target,
        type_id: top.map(|o| o.type_id),
    });
    Outcome::Applied
}

fn talk(
    _state: &mut SimulationState,
    target: Cell,
    ctx: &DispatchContext<'_>,
    events: &mut Vec<SimEvent>,
) -> Outcome {
    match ctx.world.entity_at(target) {
        Some(entity) => {
            events.push(SimEvent::TalkedTo {
                at: target,
                entity: entity.id,
            });
            Outcome::Applied
        }
        None => Outcome::Rejected(RejectReason::NoTarget),
    }
}

fn get(
    state: &mut SimulationState,
    target: Cell,
    ctx: &DispatchContext<'_>,
    events: &mut Vec<SimEvent>,
) -> Outcome {
    let Some(obj) = top_object_at(state, ctx.world, target, |o| is_pickup_type(o.type_id)) else {
        return Outcome::Rejected(RejectReason::NoTarget);
    };

    let item = ItemKey::of(&obj);
    let anchor = ObjectAnchor::of(&obj);
    let count = state.add_item(item);
    state.mark_removed(anchor, ctx.tick);
    events.push(SimEvent::ItemTaken {
        item,
        from: anchor,
        count,
    });
    Outcome::Applied
}

fn drop_item(
    state: &mut SimulationState,
    target: Cell,
    _ctx: &DispatchContext<'_>,
    events: &mut Vec<SimEvent>,
) -> Outcome {
    let Some(item) = state.first_item() else {
        return Outcome::Rejected(RejectReason::EmptyInventory);
    };
    let remaining = state.remove_item(&item).unwrap_or(0);
    events.push(SimEvent::ItemDropped {
        item,
        at: target,
        remaining,
    });
    Outcome::Applied
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::AvatarPose;
    use crate::game::world::{OpenWorld, StaticWorld};

    fn run(
        state: &mut SimulationState,
        world: &dyn WorldQuery,
        mode: InteractionMode,
        cmd: Command,
    ) -> (Outcome, Vec<SimEvent>) {
        let ctx = DispatchContext {
            world,
            mode,
            tick: cmd.tick,
        };
        let mut events = Vec::new();
        let outcome = dispatch(state, &cmd, &ctx, &mut events);
        (outcome, events)
    }

    #[test]
    fn test_move_clear() {
        let mut state = SimulationState::default();
        let (out, events) = run(&mut state, &OpenWorld, InteractionMode::Avatar, Command::move_avatar(1, 1, 0));
        assert_eq!(out, Outcome::Applied);
        assert_eq!(state.world.map_x, 0x134);
        assert_eq!(state.commands_applied, 1);
        assert!(matches!(events[0], SimEvent::AvatarMoved { .. }));
    }

    #[test]
    fn test_move_deltas_clamped() {
        let mut state = SimulationState::default();
        run(&mut state, &OpenWorld, InteractionMode::Avatar, Command::move_avatar(1, 50, -9));
        assert_eq!(state.world.avatar_cell(), Cell::new(0x134, 0x15f, 0));
    }

    #[test]
    fn test_move_blocked_in_avatar_mode_only() {
        let world = StaticWorld::demo();
        let mut state = SimulationState::default();
        state.world.map_x = 0x134;

        let (out, events) = run(&mut state, &world, InteractionMode::Avatar, Command::move_avatar(1, 1, 0));
        assert_eq!(out, Outcome::Applied);
        assert_eq!(state.world.map_x, 0x134);
        assert!(matches!(events[0], SimEvent::MoveBlocked { .. }));

        run(&mut state, &world, InteractionMode::Ghost, Command::move_avatar(2, 1, 0));
        assert_eq!(state.world.map_x, 0x135);
    }

    #[test]
    fn test_walk_into_chair_sits() {
        let world = StaticWorld::demo();
        let mut state = SimulationState::default();
        state.world.map_x = 0x132;

        let (out, _) = run(&mut state, &world, InteractionMode::Avatar, Command::move_avatar(3, -1, 0));
        assert_eq!(out, Outcome::PoseInteraction);
        assert_eq!(state.avatar_pose, AvatarPose::Sit);
        assert_eq!(state.world.map_x, 0x131);

        // A move on the same tick is discarded.
        let (out, _) = run(&mut state, &world, InteractionMode::Avatar, Command::move_avatar(3, 1, 0));
        assert_eq!(out, Outcome::Rejected(RejectReason::PoseJustSet));
        assert_eq!(state.commands_applied, 1);

        // A later move stands up and steps away.
        run(&mut state, &world, InteractionMode::Avatar, Command::move_avatar(4, 1, 0));
        assert_eq!(state.avatar_pose, AvatarPose::Stand);
        assert_eq!(state.world.map_x, 0x132);
    }

    #[test]
    fn test_use_facing_toggles_door() {
        let world = StaticWorld::demo();
        let mut state = SimulationState::default();
        state.world.map_x = 0x134;

        let (_, events) = run(&mut state, &world, InteractionMode::Avatar, Command::use_facing(1, 1, 0));
        assert!(matches!(events[0], SimEvent::DoorToggled { open: true, .. }));
        assert_eq!(state.door_open_states.len(), 1);

        run(&mut state, &world, InteractionMode::Avatar, Command::use_facing(2, 1, 0));
        assert!(state.door_open_states.is_empty());
    }

    #[test]
    fn test_get_and_drop() {
        let world = StaticWorld::demo();
        let mut state = SimulationState::default();

        let get = Command::at_cell(4, CommandKind::GetAtCell, 0x133, 0x15f);
        let (out, _) = run(&mut state, &world, InteractionMode::Avatar, get);
        assert_eq!(out, Outcome::Applied);
        let key = ItemKey::new(0x058, 0);
        assert_eq!(state.item_count(&key), 1);
        let anchor = ObjectAnchor::new(0x133, 0x15f, 0, 2, 0x058);
        assert_eq!(state.removed_objects.get(&anchor), Some(&4));

        // Already taken.
        let (out, _) = run(&mut state, &world, InteractionMode::Avatar, get);
        assert_eq!(out, Outcome::Rejected(RejectReason::NoTarget));

        let drop = Command::at_cell(5, CommandKind::DropAtCell, 0x134, 0x161);
        let (out, _) = run(&mut state, &world, InteractionMode::Avatar, drop);
        assert_eq!(out, Outcome::Applied);
        assert!(state.inventory.is_empty());

        let (out, _) = run(&mut state, &world, InteractionMode::Avatar, drop);
        assert_eq!(out, Outcome::Rejected(RejectReason::EmptyInventory));
    }

    #[test]
    fn test_decor_not_pickable() {
        let world = StaticWorld::demo();
        let mut state = SimulationState::default();
        let get = Command::at_cell(1, CommandKind::GetAtCell, 0x134, 0x15f);
        let (out, _) = run(&mut state, &world, InteractionMode::Avatar, get);
        assert_eq!(out, Outcome::Rejected(RejectReason::NoTarget));
    }

    #[test]
    fn test_range_gating() {
        let mut state = SimulationState::default();
        let far = Command::at_cell(1, CommandKind::LookAtCell, 0x133 + 6, 0x160);
        let (out, _) = run(&mut state, &OpenWorld, InteractionMode::Avatar, far);
        assert_eq!(out, Outcome::Rejected(RejectReason::OutOfRange));

        let near = Command::at_cell(1, CommandKind::LookAtCell, 0x133 + 5, 0x160);
        let (out, _) = run(&mut state, &OpenWorld, InteractionMode::Avatar, near);
        assert_eq!(out, Outcome::Applied);

        let (out, _) = run(&mut state, &OpenWorld, InteractionMode::Ghost, far);
        assert_eq!(out, Outcome::Applied);
    }

    #[test]
    fn test_policy_stubs_counted() {
        let mut state = SimulationState::default();
        for kind in [CommandKind::AttackAtCell, CommandKind::CastAtCell, CommandKind::MoveAtCell] {
            let cmd = Command::at_cell(1, kind, 0x134, 0x160);
            let (out, events) = run(&mut state, &OpenWorld, InteractionMode::Avatar, cmd);
            assert_eq!(out, Outcome::Applied);
            assert!(matches!(events[0], SimEvent::PolicyStub { .. }));
        }
        assert_eq!(state.commands_applied, 3);
    }

    #[test]
    fn test_talk_needs_entity() {
        let world = StaticWorld::demo();
        let mut state = SimulationState::default();
        state.world.map_y = 0x15e;

        let talk = Command::at_cell(1, CommandKind::TalkAtCell, 0x133, 0x15d);
        let (out, events) = run(&mut state, &world, InteractionMode::Avatar, talk);
        assert_eq!(out, Outcome::Applied);
        assert_eq!(events[0], SimEvent::TalkedTo { at: Cell::new(0x133, 0x15d, 0), entity: 7 });

        let nobody = Command::at_cell(2, CommandKind::TalkAtCell, 0x134, 0x15d);
        let (out, _) = run(&mut state, &world, InteractionMode::Avatar, nobody);
        assert_eq!(out, Outcome::Rejected(RejectReason::NoTarget));
    }
}
