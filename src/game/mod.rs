//! Game Logic Module
//!
//! All world simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `command`: Command kinds and the 16-byte wire record
//! - `queue`: Pending commands, move upsert/debounce, command log
//! - `state`: Simulation state and its fingerprint
//! - `keys`: Cell and identity keys for the keyed sub-state-machines
//! - `objects`, `world`: Object classification and the world query trait
//! - `door`, `pose`, `removal`, `inventory`, `clock`: Sub-state-machines
//! - `collision`: Blocking checks and target resolution
//! - `dispatch`: Per-command handlers
//! - `tick`: The per-tick step function
//! - `driver`: Fixed-timestep accumulator and NPC hook
//! - `events`: Step events for presentation and logs

pub mod clock;
pub mod collision;
pub mod command;
pub mod dispatch;
pub mod door;
pub mod driver;
pub mod events;
pub mod inventory;
pub mod keys;
pub mod objects;
pub mod pose;
pub mod queue;
pub mod removal;
pub mod state;
pub mod tick;
pub mod world;

// Re-export key types
pub use clock::ClockAuthority;
pub use command::{Command, CommandKind, CodecError, COMMAND_WIRE_SIZE};
pub use dispatch::InteractionMode;
pub use driver::{DriveReport, NpcStepper, TickDriver};
pub use events::{RejectReason, SimEvent};
pub use keys::{Cell, DoorKey, ItemKey, ObjectAnchor};
pub use queue::{CommandLog, CommandQueue, MoveEnqueue};
pub use state::{AvatarPose, SimulationState, SpawnedObject, WorldState};
pub use tick::{step, StepConfig, TickResult};
pub use world::{OpenWorld, StaticWorld, WorldObject, WorldQuery};
