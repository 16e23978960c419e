//! Determinism Verification
//!
//! Replays a command log twice from the same initial state and compares
//! fingerprint checkpoints. The state fingerprint and the viewport
//! animation fingerprint are dual-run separately so the two kinds of drift
//! are reported distinctly.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::hash::{fingerprint_hex, Fingerprint};
use crate::game::command::Command;
use crate::game::queue::CommandQueue;
use crate::game::state::SimulationState;
use crate::game::tick::{step, ReplayFeed, StepConfig};
use crate::game::world::WorldQuery;
use crate::replay::animation::animation_fingerprint;

/// Default checkpoint interval in ticks.
pub const CHECKPOINT_INTERVAL: u32 = 30;

/// A recorded `(tick, fingerprint)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Tick the fingerprint was taken after
    pub tick: u32,
    /// Fingerprint value
    pub hash: Fingerprint,
}

/// Which fingerprint a checkpoint run records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckpointKind {
    /// [`SimulationState::compute_fingerprint`]
    State,
    /// Viewport animation fingerprint
    Animation,
}

/// Determinism failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeterminismError {
    /// Interval of zero
    #[error("checkpoint interval must be non-zero")]
    InvalidInterval,

    /// Runs recorded different numbers of checkpoints
    #[error("checkpoint count differs: {first} vs {second}")]
    CheckpointCount { first: usize, second: usize },

    /// First diverging state checkpoint
    #[error("state drift at checkpoint {index} (tick {tick}): {first:016x} vs {second:016x}")]
    StateDrift {
        index: usize,
        tick: u32,
        first: Fingerprint,
        second: Fingerprint,
    },

    /// First diverging animation checkpoint
    #[error("animation drift at checkpoint {index} (tick {tick}): {first:016x} vs {second:016x}")]
    AnimationDrift {
        index: usize,
        tick: u32,
        first: Fingerprint,
        second: Fingerprint,
    },
}

/// Replay inputs shared by both runs.
#[derive(Clone, Copy)]
pub struct ReplaySpec<'a> {
    /// State both runs start from
    pub initial: &'a SimulationState,
    /// Commands to feed, by tick
    pub log: &'a [Command],
    /// Ticks to step
    pub ticks: u32,
    /// Checkpoint every this many ticks
    pub interval: u32,
    /// World layer
    pub world: &'a dyn WorldQuery,
    /// Stepper settings
    pub config: StepConfig,
}

/// Successful verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationReport {
    /// State checkpoints from the first run
    pub state_checkpoints: Vec<Checkpoint>,
    /// Animation checkpoints from the first run
    pub animation_checkpoints: Vec<Checkpoint>,
    /// State fingerprint after the last tick
    pub final_hash: Fingerprint,
}

/// Replay once, recording a checkpoint at every multiple of the interval
/// and at the final tick.
pub fn record_checkpoints(
    spec: &ReplaySpec<'_>,
    kind: CheckpointKind,
) -> Result<Vec<Checkpoint>, DeterminismError> {
    if spec.interval == 0 {
        return Err(DeterminismError::InvalidInterval);
    }

    let mut state = spec.initial.clone();
    let mut queue = CommandQueue::new();
    let mut feed = ReplayFeed::new(spec.log);
    let mut checkpoints = Vec::with_capacity((spec.ticks / spec.interval) as usize + 1);

    for i in 1..=spec.ticks {
        feed.feed(&mut queue, state.tick.wrapping_add(1));
        step(&mut state, &mut queue, spec.world, &spec.config);

        if state.tick % spec.interval == 0 || i == spec.ticks {
            let hash = match kind {
                CheckpointKind::State => state.compute_fingerprint(),
                CheckpointKind::Animation => animation_fingerprint(&state, spec.world),
            };
            checkpoints.push(Checkpoint {
                tick: state.tick,
                hash,
            });
        }
    }

    if feed.remaining() > 0 {
        debug!(unreplayed = feed.remaining(), "log extends past replay window");
    }

    Ok(checkpoints)
}

/// Compare two checkpoint sequences pairwise.
pub fn compare_checkpoints(
    first: &[Checkpoint],
    second: &[Checkpoint],
    kind: CheckpointKind,
) -> Result<(), DeterminismError> {
    if first.len() != second.len() {
        return Err(DeterminismError::CheckpointCount {
            first: first.len(),
            second: second.len(),
        });
    }

    for (index, (a, b)) in first.iter().zip(second).enumerate() {
        if a != b {
            warn!(index, tick = a.tick, ?kind, "checkpoint mismatch");
            let (first, second) = (a.hash, b.hash);
            return Err(match kind {
                CheckpointKind::State => DeterminismError::StateDrift {
                    index,
                    tick: a.tick,
                    first,
                    second,
                },
                CheckpointKind::Animation => DeterminismError::AnimationDrift {
                    index,
                    tick: a.tick,
                    first,
                    second,
                },
            });
        }
    }

    Ok(())
}

/// Dual-run the state fingerprint, then dual-run the animation fingerprint.
pub fn verify_determinism(spec: &ReplaySpec<'_>) -> Result<VerificationReport, DeterminismError> {
    let first = record_checkpoints(spec, CheckpointKind::State)?;
    let second = record_checkpoints(spec, CheckpointKind::State)?;
    compare_checkpoints(&first, &second, CheckpointKind::State)?;

    let anim_first = record_checkpoints(spec, CheckpointKind::Animation)?;
    let anim_second = record_checkpoints(spec, CheckpointKind::Animation)?;
    compare_checkpoints(&anim_first, &anim_second, CheckpointKind::Animation)?;

    let final_hash = first
        .last()
        .map(|c| c.hash)
        .unwrap_or_else(|| spec.initial.compute_fingerprint());

    info!(
        ticks = spec.ticks,
        checkpoints = first.len(),
        final_hash = %fingerprint_hex(final_hash),
        "determinism verified"
    );

    Ok(VerificationReport {
        state_checkpoints: first,
        animation_checkpoints: anim_first,
        final_hash,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::command::CommandKind;
    use crate::game::world::StaticWorld;

    fn sample_log() -> Vec<Command> {
        vec![
            Command::move_avatar(2, 1, 0),
            Command::use_facing(3, 1, 0),
            Command::move_avatar(4, 1, 0),
            Command::at_cell(9, CommandKind::LookAtCell, 0x133, 0x160),
            Command::move_avatar(12, -1, 0),
        ]
    }

    #[test]
    fn test_checkpoint_ticks() {
        let world = StaticWorld::demo();
        let initial = SimulationState::default();
        let log = sample_log();
        let spec = ReplaySpec {
            initial: &initial,
            log: &log,
            ticks: 20,
            interval: 5,
            world: &world,
            config: StepConfig::default(),
        };

        let cps = record_checkpoints(&spec, CheckpointKind::State).unwrap();
        let ticks: Vec<u32> = cps.iter().map(|c| c.tick).collect();
        assert_eq!(ticks, vec![5, 10, 15, 20]);

        let spec = ReplaySpec { ticks: 22, ..spec };
        let cps = record_checkpoints(&spec, CheckpointKind::State).unwrap();
        assert_eq!(cps.last().map(|c| c.tick), Some(22));
        assert_eq!(cps.len(), 5);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let world = StaticWorld::demo();
        let initial = SimulationState::default();
        let spec = ReplaySpec {
            initial: &initial,
            log: &[],
            ticks: 10,
            interval: 0,
            world: &world,
            config: StepConfig::default(),
        };
        assert_eq!(verify_determinism(&spec), Err(DeterminismError::InvalidInterval));
    }

    #[test]
    fn test_verify_passes() {
        let world = StaticWorld::demo();
        let initial = SimulationState::default();
        let log = sample_log();
        let spec = ReplaySpec {
            initial: &initial,
            log: &log,
            ticks: 90,
            interval: CHECKPOINT_INTERVAL,
            world: &world,
            config: StepConfig::default(),
        };

        let report = verify_determinism(&spec).unwrap();
        assert_eq!(report.state_checkpoints.len(), 3);
        assert_eq!(report.animation_checkpoints.len(), 3);
        assert_eq!(report.final_hash, report.state_checkpoints[2].hash);
    }

    #[test]
    fn test_compare_reports_drift() {
        let a = vec![Checkpoint { tick: 5, hash: 1 }, Checkpoint { tick: 10, hash: 2 }];
        let mut b = a.clone();
        b[1].hash = 3;

        assert_eq!(
            compare_checkpoints(&a, &b, CheckpointKind::State),
            Err(DeterminismError::StateDrift {
                index: 1,
                tick: 10,
                first: 2,
                second: 3
            })
        );
        assert!(matches!(
            compare_checkpoints(&a, &b, CheckpointKind::Animation),
            Err(DeterminismError::AnimationDrift { index: 1, .. })
        ));
        assert_eq!(
            compare_checkpoints(&a, &a[..1], CheckpointKind::State),
            Err(DeterminismError::CheckpointCount { first: 2, second: 1 })
        );
    }
}
