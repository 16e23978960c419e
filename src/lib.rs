//! # Worldsim
//!
//! Deterministic tick-stepped world simulation with replay verification.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         WORLDSIM                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Xorshift32 PRNG                           │
//! │  └── hash.rs     - FNV-1a 64 state hashing                   │
//! │                                                              │
//! │  game/           - Simulation (deterministic)                │
//! │  ├── command.rs  - Commands and 16-byte wire record          │
//! │  ├── queue.rs    - Command queue and replay log              │
//! │  ├── state.rs    - Simulation state and fingerprint          │
//! │  ├── dispatch.rs - Per-command handlers                      │
//! │  ├── tick.rs     - Per-tick step function                    │
//! │  ├── driver.rs   - Fixed-timestep accumulator                │
//! │  └── door, pose, removal, inventory, clock                   │
//! │                                                              │
//! │  replay/         - Verification and persistence              │
//! │  ├── verify.rs   - Dual-run determinism verifier             │
//! │  ├── animation.rs- Viewport animation fingerprint            │
//! │  ├── snapshot.rs - JSON and binary snapshots                 │
//! │  └── log.rs      - Command logs and checkpoint CSV           │
//! │                                                              │
//! │  config.rs       - Run configuration (JSON)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No floating-point arithmetic
//! - No HashMap (BTreeMap/BTreeSet for sorted iteration)
//! - No system time inside the stepper (wall time only feeds the driver)
//! - All randomness from the seeded xorshift32 state
//! - Explicit wrapping u32/i32 arithmetic everywhere it can overflow
//!
//! Given identical initial state, command log and world answers, every
//! replay produces **identical fingerprints** at every checkpoint.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod replay;

// Re-export commonly used types
pub use config::SimConfig;
pub use crate::core::hash::{fingerprint_hex, Fingerprint};
pub use crate::core::rng::SimRng;
pub use game::command::{Command, CommandKind};
pub use game::queue::CommandQueue;
pub use game::state::SimulationState;
pub use game::tick::{step, StepConfig, TickResult};
pub use game::world::{StaticWorld, WorldQuery};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wall-clock duration of one tick (ms)
pub const TICK_MS: u64 = game::driver::TICK_MS;

/// Ticks per game minute
pub const TICKS_PER_MINUTE: u32 = game::clock::TICKS_PER_MINUTE;
