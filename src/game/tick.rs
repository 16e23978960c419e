//! Simulation Tick
//!
//! The per-tick state transition. Must be 100% deterministic: the same
//! state, queue and world answers always produce the same next state.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game::clock::{is_minute_tick, ClockAuthority};
use crate::game::command::Command;
use crate::game::dispatch::{dispatch, DispatchContext, InteractionMode, Outcome};
use crate::game::events::{RejectReason, SimEvent};
use crate::game::keys::ObjectAnchor;
use crate::game::queue::CommandQueue;
use crate::game::state::SimulationState;
use crate::game::world::WorldQuery;

/// Result of one step.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickResult {
    /// Tick committed by this step
    pub tick: u32,
    /// Commands applied
    pub applied: u32,
    /// Commands rejected or dropped
    pub rejected: u32,
    /// Objects that respawned
    pub respawned: Vec<ObjectAnchor>,
    /// Whether the calendar advanced
    pub minute_advanced: bool,
    /// Events generated this step
    pub events: Vec<SimEvent>,
}

/// Per-step policy. Not part of simulation state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConfig {
    /// Ghost or avatar policy
    pub mode: InteractionMode,
    /// Whether the stepper owns the calendar
    pub clock: ClockAuthority,
}

/// Run one simulation step.
///
/// 1. Apply commands due at `tick + 1` in queue order
/// 2. Advance the PRNG and mix its low bit into `world_flags`
/// 3. Expire timed object removals
/// 4. Advance the calendar on minute ticks (local clock only)
/// 5. Commit the new tick
///
/// Never fails. Commands for later ticks stay queued.
pub fn step(
    state: &mut SimulationState,
    queue: &mut CommandQueue,
    world: &dyn WorldQuery,
    config: &StepConfig,
) -> TickResult {
    let next_tick = state.tick.wrapping_add(1);
    let mut result = TickResult {
        tick: next_tick,
        ..TickResult::default()
    };

    let taken = queue.take_due(next_tick);
    if !taken.stale.is_empty() {
        debug!(tick = next_tick, dropped = taken.stale.len(), "dropping stale commands");
        result.rejected += taken.stale.len() as u32;
    }

    // ==========================================================================
    // Phase 1: Commands
    // ==========================================================================
    let ctx = DispatchContext {
        world,
        mode: config.mode,
        tick: next_tick,
    };
    let mut pose_interacted = false;
    for cmd in &taken.due {
        if pose_interacted && cmd.is_move() {
            result.events.push(SimEvent::CommandRejected {
                kind: cmd.kind,
                reason: RejectReason::Superseded,
            });
            result.rejected += 1;
            continue;
        }

        match dispatch(state, cmd, &ctx, &mut result.events) {
            Outcome::Applied => result.applied += 1,
            Outcome::PoseInteraction => {
                result.applied += 1;
                pose_interacted = true;
                queue.reset_move_debounce();
            }
            Outcome::Rejected(_) => result.rejected += 1,
        }
    }

    // ==========================================================================
    // Phase 2: PRNG
    // ==========================================================================
    state.rng.next_u32();
    state.world_flags ^= state.rng.low_bit();

    // ==========================================================================
    // Phase 3: Respawns
    // ==========================================================================
    result.respawned = state.expire_removals(next_tick);
    for anchor in &result.respawned {
        result.events.push(SimEvent::ObjectRespawned { anchor: *anchor });
    }

    // ==========================================================================
    // Phase 4: Clock
    // ==========================================================================
    if config.clock == ClockAuthority::Local && is_minute_tick(next_tick) {
        state.world.advance_minute();
        result.minute_advanced = true;
        result.events.push(SimEvent::MinuteAdvanced {
            hour: state.world.hour,
            minute: state.world.minute,
        });
    }

    state.tick = next_tick;
    result
}

// =============================================================================
// REPLAY
// =============================================================================

/// Feeds a recorded command log into a queue one tick at a time.
#[derive(Clone, Debug)]
pub struct ReplayFeed {
    commands: Vec<Command>,
    cursor: usize,
}

impl ReplayFeed {
    /// Commands are stably ordered by tick; same-tick order is preserved.
    pub fn new(log: &[Command]) -> Self {
        let mut commands = log.to_vec();
        commands.sort_by_key(|c| c.tick);
        Self {
            commands,
            cursor: 0,
        }
    }

    /// Schedule every command targeting a tick up to `next_tick`.
    pub fn feed(&mut self, queue: &mut CommandQueue, next_tick: u32) {
        while let Some(cmd) = self.commands.get(self.cursor) {
            if cmd.tick > next_tick {
                break;
            }
            queue.schedule(*cmd);
            self.cursor += 1;
        }
    }

    /// Commands not yet scheduled.
    pub fn remaining(&self) -> usize {
        self.commands.len() - self.cursor
    }
}

/// Replay `log` from `initial` for `tick_count` steps.
pub fn replay_log(
    initial: &SimulationState,
    log: &[Command],
    tick_count: u32,
    world: &dyn WorldQuery,
    config: &StepConfig,
) -> (SimulationState, Vec<SimEvent>) {
    let mut state = initial.clone();
    let mut queue = CommandQueue::new();
    let mut feed = ReplayFeed::new(log);
    let mut all_events = Vec::new();

    for _ in 0..tick_count {
        feed.feed(&mut queue, state.tick.wrapping_add(1));
        let result = step(&mut state, &mut queue, world, config);
        all_events.extend(result.events);
    }

    (state, all_events)
}

// =============================================================================
// TESTS
// =============================================================================
