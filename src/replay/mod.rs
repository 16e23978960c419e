//! Replay and Verification Module
//!
//! Determinism checks, snapshots and on-disk replay artefacts.
//!
//! ## Verification Flow
//!
//! 1. Record a command log while playing
//! 2. Replay it twice from the same initial state
//! 3. Compare state fingerprints at each checkpoint
//! 4. Repeat with the viewport animation fingerprint

pub mod animation;
pub mod log;
pub mod snapshot;
pub mod verify;

pub use animation::{animation_fingerprint, VIEW_H, VIEW_W};
pub use log::{read_checkpoints, read_command_log, write_checkpoints, write_command_log, LogError};
pub use snapshot::SnapshotError;
pub use verify::{
    verify_determinism, Checkpoint, CheckpointKind, DeterminismError, ReplaySpec,
    VerificationReport, CHECKPOINT_INTERVAL,
};
