//! Fixed-timestep driver.
//!
//! Buffers wall-clock time and drains whole ticks synchronously. External
//! NPC stepping runs after the stepper on every [`NPC_STEP_INTERVAL_TICKS`]th
//! tick and never goes through the command queue.

use tracing::trace;

use crate::game::queue::CommandQueue;
use crate::game::state::SimulationState;
use crate::game::tick::{step, StepConfig, TickResult};
use crate::game::world::WorldQuery;

/// Wall-clock duration of one tick.
pub const TICK_MS: u64 = 100;

/// NPC stepping cadence in ticks.
pub const NPC_STEP_INTERVAL_TICKS: u32 = 2;

/// Upper bound on ticks drained by one `advance` call.
pub const MAX_CATCHUP_TICKS: u32 = 64;

/// External NPC movement, driven at the tick cadence.
///
/// Implementations see the committed state read-only, so they can resolve
/// collisions with [`check_move`](crate::game::collision::check_move) the
/// same way the avatar does.
pub trait NpcStepper {
    /// Step NPCs for `tick`. Returns the number of blocked move attempts.
    fn step(&mut self, tick: u32, state: &SimulationState, world: &dyn WorldQuery) -> u32;
}

/// Summary of one `advance` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DriveReport {
    /// Ticks stepped
    pub ticks: u32,
    /// Commands applied across those ticks
    pub commands_applied: u32,
    /// Blocked NPC moves reported by the stepper
    pub npc_blocked_moves: u32,
}

/// Wall-clock accumulator.
#[derive(Clone, Debug, Default)]
pub struct TickDriver {
    accumulator_ms: u64,
    config: StepConfig,
}

impl TickDriver {
    /// Driver with an empty accumulator.
    pub fn new(config: StepConfig) -> Self {
        Self {
            accumulator_ms: 0,
            config,
        }
    }

    /// Settings passed to every step.
    pub fn config(&self) -> &StepConfig {
        &self.config
    }

    /// Buffered time not yet consumed by a tick.
    pub fn pending_ms(&self) -> u64 {
        self.accumulator_ms
    }

    /// Add `elapsed_ms` and run every whole tick it covers.
    ///
    /// Catch-up is capped at [`MAX_CATCHUP_TICKS`]. Whole ticks beyond the
    /// cap are dropped and only the sub-tick remainder is carried.
    pub fn advance(
        &mut self,
        elapsed_ms: u64,
        state: &mut SimulationState,
        queue: &mut CommandQueue,
        world: &dyn WorldQuery,
        mut npcs: Option<&mut dyn NpcStepper>,
        mut on_tick: impl FnMut(&TickResult),
    ) -> DriveReport {
        self.accumulator_ms = self.accumulator_ms.saturating_add(elapsed_ms);
        let mut report = DriveReport::default();

        while self.accumulator_ms >= TICK_MS {
            if report.ticks >= MAX_CATCHUP_TICKS {
                trace!(dropped_ms = self.accumulator_ms, "tick catch-up capped");
                self.accumulator_ms %= TICK_MS;
                break;
            }
            self.accumulator_ms -= TICK_MS;

            let result = step(state, queue, world, &self.config);
            report.ticks += 1;
            report.commands_applied += result.applied;

            if result.tick % NPC_STEP_INTERVAL_TICKS == 0 {
                if let Some(npcs) = npcs.as_deref_mut() {
                    report.npc_blocked_moves += npcs.step(result.tick, state, world);
                }
            }

            on_tick(&result);
        }

        report
    }
}
