//! End-to-end determinism and scenario tests against the public API.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use worldsim::game::command::{decode_stream, encode_stream};
use worldsim::game::dispatch::InteractionMode;
use worldsim::game::events::SimEvent;
use worldsim::game::keys::{DoorKey, ItemKey, ObjectAnchor};
use worldsim::game::queue::MoveEnqueue;
use worldsim::game::removal::WORLD_PROP_RESET_TICKS;
use worldsim::game::state::AvatarPose;
use worldsim::game::tick::replay_log;
use worldsim::game::world::OpenWorld;
use worldsim::replay::{snapshot, verify_determinism, ReplaySpec};
use worldsim::{
    step, Command, CommandKind, CommandQueue, SimulationState, StaticWorld, StepConfig,
};

fn run(state: &mut SimulationState, queue: &mut CommandQueue, world: &StaticWorld, ticks: u32) -> Vec<SimEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        events.extend(step(state, queue, world, &StepConfig::default()).events);
    }
    events
}

// =============================================================================
// SCENARIOS
// =============================================================================

#[test]
fn walk_to_door_open_and_pass() {
    let world = StaticWorld::demo();
    let mut state = SimulationState::default();
    let mut queue = CommandQueue::new();

    queue.enqueue_move(state.tick, 1, 0, 0);
    run(&mut state, &mut queue, &world, 1);
    assert_eq!(state.world.map_x, 0x134);

    // Closed door blocks but the move still counts.
    queue.enqueue_move(state.tick, 1, 0, 1_000);
    let events = run(&mut state, &mut queue, &world, 1);
    assert_eq!(state.world.map_x, 0x134);
    assert_eq!(state.commands_applied, 2);
    assert!(events.iter().any(|e| matches!(e, SimEvent::MoveBlocked { .. })));

    queue.enqueue(Command::use_facing(state.tick + 1, 1, 0));
    let events = run(&mut state, &mut queue, &world, 1);
    assert!(events.contains(&SimEvent::DoorToggled {
        door: DoorKey::new(0x135, 0x160, 0, 1),
        open: true,
    }));

    queue.enqueue_move(state.tick, 1, 0, 2_000);
    run(&mut state, &mut queue, &world, 1);
    assert_eq!(state.world.map_x, 0x135);
}

#[test]
fn door_toggled_twice_restores_fingerprint_contribution() {
    let world = StaticWorld::demo();
    let mut state = SimulationState::default();
    state.world.map_x = 0x134;
    let mut queue = CommandQueue::new();

    let closed = state.clone();
    queue.enqueue(Command::use_facing(state.tick + 1, 1, 0));
    run(&mut state, &mut queue, &world, 1);
    assert!(state.is_door_toggled(&DoorKey::new(0x135, 0x160, 0, 1)));

    queue.enqueue(Command::use_facing(state.tick + 1, 1, 0));
    run(&mut state, &mut queue, &world, 1);
    assert!(state.door_open_states.is_empty());

    // Only tick-driven fields differ from the untouched state.
    let mut reference = closed;
    reference.tick = state.tick;
    reference.rng = state.rng;
    reference.world_flags = state.world_flags;
    reference.commands_applied = state.commands_applied;
    assert_eq!(reference.compute_fingerprint(), state.compute_fingerprint());
}

#[test]
fn pickup_taken_then_respawns() {
    let world = StaticWorld::demo();
    let mut state = SimulationState::default();
    let mut queue = CommandQueue::new();
    let anchor = ObjectAnchor::new(0x133, 0x15f, 0, 2, 0x058);

    queue.enqueue_verb(state.tick, CommandKind::GetAtCell, 0x133, 0x15f);
    let events = run(&mut state, &mut queue, &world, 1);
    assert_eq!(state.item_count(&ItemKey::new(0x058, 0)), 1);
    assert!(state.is_removed(&anchor));
    assert!(matches!(events[0], SimEvent::ItemTaken { count: 1, .. }));

    // A second get finds nothing.
    queue.enqueue_verb(state.tick, CommandKind::GetAtCell, 0x133, 0x15f);
    run(&mut state, &mut queue, &world, 1);
    assert_eq!(state.item_count(&ItemKey::new(0x058, 0)), 1);

    let events = run(&mut state, &mut queue, &world, WORLD_PROP_RESET_TICKS);
    assert!(!state.is_removed(&anchor));
    assert!(events.contains(&SimEvent::ObjectRespawned { anchor }));
    state.validate().unwrap();
}

#[test]
fn walking_into_chair_sits_then_stands() {
    let world = StaticWorld::demo();
    let mut state = SimulationState::default();
    state.world.map_x = 0x132;
    let mut queue = CommandQueue::new();

    queue.enqueue_move(state.tick, -1, 0, 0);
    run(&mut state, &mut queue, &world, 1);
    assert_eq!(state.avatar_pose, AvatarPose::Sit);
    assert_eq!(state.world.map_x, 0x131);

    queue.enqueue_move(state.tick, 1, 0, 1_000);
    run(&mut state, &mut queue, &world, 1);
    assert_eq!(state.avatar_pose, AvatarPose::Stand);
    assert_eq!(state.world.map_x, 0x132);
    state.validate().unwrap();
}

#[test]
fn debounce_and_upsert() {
    let mut queue = CommandQueue::new();
    assert_eq!(queue.enqueue_move(0, 1, 0, 0), MoveEnqueue::Queued);
    assert_eq!(queue.enqueue_move(0, 1, 0, 50), MoveEnqueue::Debounced);
    assert_eq!(queue.enqueue_move(0, 0, 1, 60), MoveEnqueue::Replaced);
    assert_eq!(queue.pending(), &[Command::move_avatar(1, 0, 1)]);
    assert_eq!(queue.log().to_vec(), vec![Command::move_avatar(1, 0, 1)]);

    let mut state = SimulationState::default();
    step(&mut state, &mut queue, &OpenWorld, &StepConfig::default());
    assert_eq!(state.world.map_y, 0x161);
    assert_eq!(state.world.map_x, 0x133);
}

#[test]
fn replaced_move_runs_after_queued_verbs() {
    let world = StaticWorld::demo();
    let mut initial = SimulationState::default();
    initial.world.map_x = 0x134;

    let mut live = initial.clone();
    let mut queue = CommandQueue::new();
    queue.enqueue_move(0, 0, 1, 0);
    queue.enqueue_verb(0, CommandKind::UseAtCell, 0x135, 0x160);
    assert_eq!(queue.enqueue_move(0, 1, 0, 10), MoveEnqueue::Replaced);
    let kinds: Vec<CommandKind> = queue.log().iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![CommandKind::UseAtCell, CommandKind::MoveAvatar]);

    // The use opens the door before the re-appended move walks through it.
    run(&mut live, &mut queue, &world, 3);
    assert_eq!(live.world.map_x, 0x135);
    assert_eq!(live.door_open_states.len(), 1);

    let (replayed, _) = replay_log(&initial, &queue.log().to_vec(), 3, &world, &StepConfig::default());
    assert_eq!(replayed, live);
}

#[test]
fn calendar_rolls_over() {
    let mut state = SimulationState::default();
    state.world.minute = 59;
    state.world.hour = 23;
    state.world.day = 28;
    state.world.month = 13;
    let mut queue = CommandQueue::new();

    for _ in 0..4 {
        step(&mut state, &mut queue, &OpenWorld, &StepConfig::default());
    }
    assert_eq!(
        (state.world.minute, state.world.hour, state.world.day, state.world.month, state.world.year),
        (0, 0, 1, 1, 162)
    );
}

#[test]
fn ghost_mode_walks_through_walls() {
    let world = StaticWorld::demo();
    let ghost = StepConfig {
        mode: InteractionMode::Ghost,
        ..StepConfig::default()
    };
    let mut state = SimulationState::default();
    state.world.map_x = 0x134;
    let mut queue = CommandQueue::new();

    queue.enqueue_move(state.tick, 1, 0, 0);
    step(&mut state, &mut queue, &world, &ghost);
    assert_eq!(state.world.map_x, 0x135);
}

// =============================================================================
// FINGERPRINT
// =============================================================================

#[test]
fn fingerprint_independent_of_insertion_order() {
    let doors: Vec<DoorKey> = (0..20).map(|i| DoorKey::new(100 + i, 200 - i, 0, (i % 3) as u16)).collect();
    let items: Vec<(ItemKey, u32)> = (0..20).map(|i| (ItemKey::new(i * 7, (i % 5) as u8), u32::from(i) + 1)).collect();
    // x crosses 99/100 so text order and numeric order disagree.
    let removed: Vec<(ObjectAnchor, u32)> = (0..20)
        .map(|i| (ObjectAnchor::new(90 + i * 5, 0x160 - i, i % 2, (i % 4) as u16, 0x058), 1_000 + 37 * i as u32))
        .collect();

    let mut a = SimulationState::default();
    for d in &doors {
        a.door_open_states.insert(*d);
    }
    for (k, n) in &items {
        a.inventory.insert(*k, *n);
    }
    for (anchor, tick) in &removed {
        assert!(a.mark_removed(*anchor, *tick));
    }

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..5 {
        let mut doors = doors.clone();
        let mut items = items.clone();
        let mut removed = removed.clone();
        doors.shuffle(&mut rng);
        items.shuffle(&mut rng);
        removed.shuffle(&mut rng);

        let mut b = SimulationState::default();
        for d in &doors {
            b.door_open_states.insert(*d);
        }
        for (k, n) in &items {
            b.inventory.insert(*k, *n);
        }
        for (anchor, tick) in &removed {
            b.mark_removed(*anchor, *tick);
        }
        assert_eq!(b.removed_object_count, 20);
        assert_eq!(a.compute_fingerprint(), b.compute_fingerprint());
    }

    // Removal ticks are part of the fold.
    let mut c = a.clone();
    let (first, tick) = removed[0];
    c.removed_objects.insert(first, tick + 1);
    assert_ne!(a.compute_fingerprint(), c.compute_fingerprint());
}

#[test]
fn snapshot_resume_matches_uninterrupted_run() {
    let world = StaticWorld::demo();
    let config = StepConfig::default();
    let log = vec![
        Command::move_avatar(1, 1, 0),
        Command::use_facing(3, 1, 0),
        Command::at_cell(5, CommandKind::GetAtCell, 0x134, 0x15f),
        Command::move_avatar(40, 1, 0),
        Command::move_avatar(41, 1, 0),
    ];
    let initial = SimulationState::default();
    let (full, _) = replay_log(&initial, &log, 80, &world, &config);

    let (half, _) = replay_log(&initial, &log, 20, &world, &config);
    let bytes = snapshot::encode(&half).unwrap();
    let resumed = snapshot::decode(&bytes).unwrap();
    let rest: Vec<Command> = log.iter().copied().filter(|c| c.tick > 20).collect();
    let (finished, _) = replay_log(&resumed, &rest, 60, &world, &config);

    assert_eq!(finished, full);
    assert_eq!(finished.compute_fingerprint(), full.compute_fingerprint());
}

// =============================================================================
// PROPERTIES
// =============================================================================

fn arb_command() -> impl Strategy<Value = Command> {
    (
        1u32..120,
        prop::sample::select(CommandKind::ALL.to_vec()),
        -2i32..=2,
        -2i32..=2,
    )
        .prop_map(|(tick, kind, a, b)| {
            if kind.is_relative() {
                Command::new(tick, kind, a, b)
            } else {
                Command::new(tick, kind, 0x133 + a, 0x160 + b)
            }
        })
}

/// Any record the wire format can carry: full u32 ticks and i32 arguments.
fn arb_wire_command() -> impl Strategy<Value = Command> {
    (
        any::<u32>(),
        prop::sample::select(CommandKind::ALL.to_vec()),
        any::<i32>(),
        any::<i32>(),
    )
        .prop_map(|(tick, kind, a, b)| Command::new(tick, kind, a, b))
}

proptest! {
    #[test]
    fn wire_stream_survives(cmds in prop::collection::vec(arb_wire_command(), 0..64)) {
        let bytes = encode_stream(&cmds);
        prop_assert_eq!(bytes.len(), cmds.len() * 16);
        let decoded = decode_stream(&bytes).unwrap();
        prop_assert_eq!(decoded.commands, cmds);
        prop_assert_eq!(decoded.skipped, 0);
    }

    #[test]
    fn random_logs_replay_identically(
        cmds in prop::collection::vec(arb_command(), 0..80),
        seed in any::<u32>(),
    ) {
        let world = StaticWorld::demo();
        let mut initial = SimulationState::default();
        initial.rng = worldsim::SimRng::new(seed);
        let spec = ReplaySpec {
            initial: &initial,
            log: &cmds,
            ticks: 150,
            interval: 30,
            world: &world,
            config: StepConfig::default(),
        };
        let report = verify_determinism(&spec).unwrap();
        prop_assert_eq!(report.state_checkpoints.len(), 5);

        let (state, _) = replay_log(&initial, &cmds, 150, &world, &StepConfig::default());
        prop_assert_eq!(state.compute_fingerprint(), report.final_hash);
        prop_assert!(state.validate().is_ok());
    }
}
