//! Worldsim Demo Harness
//!
//! Drives the simulation headlessly through the fixed-timestep driver with a
//! scripted input sequence, then verifies determinism by replaying the
//! recorded command log.
//!
//! Usage: `worldsim [config.json] [out_dir]`
//!
//! With `out_dir`, the command log and checkpoint CSV are written there.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use worldsim::{
    fingerprint_hex,
    game::{
        collision::{check_move, MoveCheck},
        command::CommandKind,
        driver::{NpcStepper, TickDriver, TICK_MS},
        events::SimEvent,
        keys::Cell,
        queue::CommandQueue,
        world::{StaticWorld, WorldQuery},
    },
    replay::{log, snapshot, verify_determinism, ReplaySpec},
    Command, SimConfig, SimulationState, VERSION,
};

/// Wall-clock frame length fed to the driver.
const FRAME_MS: u64 = 50;

/// Total demo duration.
const DEMO_MS: u64 = 12_000;

/// Scripted player input.
#[derive(Clone, Copy, Debug)]
enum Input {
    Move(i32, i32),
    Facing(i32, i32),
    Verb(CommandKind, i32, i32),
}

/// `(wall-clock ms, input)` pairs, sorted by time.
fn script() -> Vec<(u64, Input)> {
    vec![
        (100, Input::Verb(CommandKind::GetAtCell, 0x133, 0x15f)),
        (300, Input::Move(1, 0)),
        (350, Input::Move(1, 0)), // debounced
        (600, Input::Facing(1, 0)),
        (900, Input::Move(1, 0)),
        (1200, Input::Move(1, 0)),
        (1500, Input::Move(-1, 0)),
        (1800, Input::Move(-1, 0)),
        (2100, Input::Verb(CommandKind::DropAtCell, 0x134, 0x161)),
        (2400, Input::Move(-1, 0)),
        (2700, Input::Move(-1, 0)),
        (3000, Input::Move(-1, 0)), // walks into the chair
        (3600, Input::Move(1, 0)),
        (4000, Input::Verb(CommandKind::LookAtCell, 0x135, 0x160)),
        (4300, Input::Verb(CommandKind::AttackAtCell, 0x133, 0x15d)),
        (4600, Input::Verb(CommandKind::CastAtCell, 0x136, 0x160)),
    ]
}

/// A single NPC pacing east/west past the avatar's start.
///
/// Turns around at anything the avatar could not walk into, and at the
/// avatar itself.
struct Pacer {
    cell: Cell,
    dir: i32,
}

impl NpcStepper for Pacer {
    fn step(&mut self, _tick: u32, state: &SimulationState, world: &dyn WorldQuery) -> u32 {
        let next = self.cell.offset(self.dir, 0);
        if next == state.world.avatar_cell() || check_move(state, world, next) != MoveCheck::Clear {
            self.dir = -self.dir;
            return 1;
        }
        self.cell = next;
        0
    }
}

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("Worldsim v{}", VERSION);

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => SimConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => SimConfig::default(),
    };
    let out_dir = args.next().map(PathBuf::from);
    info!(
        seed = config.seed,
        mode = ?config.mode,
        clock = ?config.clock,
        interval = config.checkpoint_interval,
        "config loaded"
    );

    run_demo(&config, out_dir.as_deref())
}

fn run_demo(config: &SimConfig, out_dir: Option<&Path>) -> Result<()> {
    info!("=== Starting Demo Run ===");

    let world = StaticWorld::demo();
    let initial = config.initial_state();
    let mut state = initial.clone();
    let mut queue = CommandQueue::new();
    let mut driver = TickDriver::new(config.step_config());
    let mut npc = Pacer {
        cell: Cell::new(0x130, 0x15e, 0),
        dir: 1,
    };

    info!("Initial fingerprint: {}", fingerprint_hex(state.compute_fingerprint()));

    let script = script();
    let mut next_input = 0;
    let mut total_events = 0usize;
    let mut npc_blocked = 0u32;
    let mut now_ms = 0u64;

    while now_ms < DEMO_MS {
        while let Some((at, input)) = script.get(next_input) {
            if *at > now_ms {
                break;
            }
            match *input {
                Input::Move(dx, dy) => {
                    let outcome = queue.enqueue_move(state.tick, dx, dy, now_ms);
                    debug!(dx, dy, ?outcome, "move input");
                }
                Input::Facing(dx, dy) => {
                    queue.enqueue(Command::use_facing(state.tick.wrapping_add(1), dx, dy));
                }
                Input::Verb(kind, x, y) => queue.enqueue_verb(state.tick, kind, x, y),
            }
            next_input += 1;
        }

        now_ms += FRAME_MS;
        let report = driver.advance(FRAME_MS, &mut state, &mut queue, &world, Some(&mut npc as &mut dyn NpcStepper), |result| {
            total_events += result.events.len();
            for event in &result.events {
                log_event(result.tick, event);
            }
        });
        npc_blocked += report.npc_blocked_moves;
    }

    info!("=== Run Results ===");
    let final_hash = state.compute_fingerprint();
    info!("Ticks: {} ({} ms per tick)", state.tick, TICK_MS);
    info!("Commands applied: {}", state.commands_applied);
    info!(
        "Avatar at ({:#x}, {:#x}, {}) pose {:?}",
        state.world.map_x, state.world.map_y, state.world.map_z, state.avatar_pose
    );
    info!(
        "Clock {:02}:{:02} day {} month {} year {} ({})",
        state.world.hour,
        state.world.minute,
        state.world.day,
        state.world.month,
        state.world.year,
        state.world.time_of_day()
    );
    info!("Total events: {}, NPC blocked moves: {}", total_events, npc_blocked);
    info!("Final fingerprint: {}", fingerprint_hex(final_hash));

    // Snapshot round-trip
    let bytes = snapshot::encode(&state).context("encoding snapshot")?;
    let restored = snapshot::decode(&bytes).context("decoding snapshot")?;
    if restored.compute_fingerprint() != final_hash {
        bail!("snapshot round-trip changed the fingerprint");
    }
    info!("Snapshot: {} bytes, fingerprint preserved", bytes.len());

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let commands = queue.log().to_vec();
    let spec = ReplaySpec {
        initial: &initial,
        log: &commands,
        ticks: state.tick,
        interval: config.checkpoint_interval,
        world: &world,
        config: config.step_config(),
    };
    let report = verify_determinism(&spec).context("determinism check failed")?;

    info!("Replay fingerprint: {}", fingerprint_hex(report.final_hash));
    if report.final_hash == final_hash {
        info!("DETERMINISM VERIFIED: fingerprints match!");
    } else {
        warn!("Replay diverged from the live run");
        bail!("live and replayed fingerprints differ");
    }

    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        log::write_command_log(dir.join("commands.bin"), &commands)?;
        log::write_checkpoint_file(dir.join("checkpoints.csv"), &report.state_checkpoints)?;
        info!(
            "Wrote {} commands and {} checkpoints to {}",
            commands.len(),
            report.state_checkpoints.len(),
            dir.display()
        );
    }

    Ok(())
}

fn log_event(tick: u32, event: &SimEvent) {
    match event {
        SimEvent::DoorToggled { door, open } => info!(tick, %door, open, "door toggled"),
        SimEvent::PoseChanged { from, to, .. } => info!(tick, ?from, ?to, "pose changed"),
        SimEvent::ItemTaken { item, count, .. } => info!(tick, %item, count, "item taken"),
        SimEvent::ItemDropped { item, remaining, .. } => info!(tick, %item, remaining, "item dropped"),
        SimEvent::MoveBlocked { at, reason } => info!(tick, x = at.x, y = at.y, ?reason, "move blocked"),
        SimEvent::CommandRejected { kind, reason } => warn!(tick, ?kind, ?reason, "command rejected"),
        SimEvent::MinuteAdvanced { hour, minute } if *minute % 10 == 0 => {
            info!(tick, "clock {:02}:{:02}", hour, minute)
        }
        other => debug!(tick, event = other.name(), "event"),
    }
}
