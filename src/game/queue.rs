//! Command Queue and Command Log
//!
//! The queue holds commands that are not yet due. Moves are special: at most
//! one move may be pending per target tick, and repeating the same direction
//! faster than [`MOVE_INPUT_MIN_INTERVAL_MS`] is ignored.
//!
//! Every issued command is also appended to a bounded [`CommandLog`] that
//! feeds replay.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::game::command::{Command, CommandKind};

/// Minimum wall-clock gap between two identical move inputs.
pub const MOVE_INPUT_MIN_INTERVAL_MS: u64 = 120;

/// Command log ring capacity.
pub const COMMAND_LOG_MAX: usize = 4096;

// =============================================================================
// COMMAND LOG
// =============================================================================

/// Bounded, oldest-evicted record of issued commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLog {
    entries: VecDeque<Command>,
    capacity: usize,
}

impl Default for CommandLog {
    fn default() -> Self {
        Self::with_capacity(COMMAND_LOG_MAX)
    }
}

impl CommandLog {
    /// Create a log holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(COMMAND_LOG_MAX)),
            capacity,
        }
    }

    /// Append, evicting the oldest entries beyond capacity.
    pub fn push(&mut self, cmd: Command) {
        self.entries.push_back(cmd);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Drop the newest move entry targeting `cmd.tick` and append `cmd`.
    fn requeue_move(&mut self, cmd: Command) {
        let found = self
            .entries
            .iter()
            .rposition(|c| c.is_move() && c.tick == cmd.tick);
        if let Some(i) = found {
            self.entries.remove(i);
        }
        self.push(cmd);
    }

    /// Entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been logged (or everything was evicted).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum entries before eviction.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.entries.iter()
    }

    /// Copy of the entries, oldest first.
    pub fn to_vec(&self) -> Vec<Command> {
        self.entries.iter().copied().collect()
    }
}

// =============================================================================
// COMMAND QUEUE
// =============================================================================

/// Outcome of [`CommandQueue::enqueue_move`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveEnqueue {
    /// Same direction repeated inside the debounce window
    Debounced,
    /// An identical move already targets the tick
    Unchanged,
    /// A different move at the tick was superseded and re-appended
    Replaced,
    /// Appended as the only pending move
    Queued,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LastMove {
    dx: i32,
    dy: i32,
    at_ms: u64,
}

/// Commands split off the queue for one step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DueCommands {
    /// Commands targeting the step tick, in queue order
    pub due: Vec<Command>,
    /// Commands whose tick had already passed
    pub stale: Vec<Command>,
}

/// Pending commands plus the replay log.
#[derive(Clone, Debug, Default)]
pub struct CommandQueue {
    pending: Vec<Command>,
    log: CommandLog,
    last_move: Option<LastMove>,
}

impl CommandQueue {
    /// Empty queue with a [`COMMAND_LOG_MAX`] log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue with a custom log capacity.
    pub fn with_log_capacity(capacity: usize) -> Self {
        Self {
            log: CommandLog::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Queue an avatar move for `current_tick + 1`.
    pub fn enqueue_move(&mut self, current_tick: u32, dx: i32, dy: i32, now_ms: u64) -> MoveEnqueue {
        if let Some(last) = self.last_move {
            if last.dx == dx
                && last.dy == dy
                && now_ms.saturating_sub(last.at_ms) < MOVE_INPUT_MIN_INTERVAL_MS
            {
                return MoveEnqueue::Debounced;
            }
        }

        let target = current_tick.wrapping_add(1);
        let cmd = Command::move_avatar(target, dx, dy);

        let outcome = match self
            .pending
            .iter()
            .rposition(|c| c.is_move() && c.tick == target)
        {
            Some(i) if self.pending[i] == cmd => return MoveEnqueue::Unchanged,
            Some(i) => {
                self.pending.remove(i);
                self.pending.push(cmd);
                self.log.requeue_move(cmd);
                MoveEnqueue::Replaced
            }
            None => {
                self.pending.retain(|c| !c.is_move());
                self.pending.push(cmd);
                self.log.push(cmd);
                MoveEnqueue::Queued
            }
        };

        self.last_move = Some(LastMove { dx, dy, at_ms: now_ms });
        outcome
    }

    /// Append any command (never coalesced) and log it.
    pub fn enqueue(&mut self, cmd: Command) {
        self.pending.push(cmd);
        self.log.push(cmd);
    }

    /// Append a non-move verb at `current_tick + 1`.
    pub fn enqueue_verb(&mut self, current_tick: u32, kind: CommandKind, arg0: i32, arg1: i32) {
        self.enqueue(Command::new(current_tick.wrapping_add(1), kind, arg0, arg1));
    }

    /// Append without logging (replaying an existing log).
    pub fn schedule(&mut self, cmd: Command) {
        self.pending.push(cmd);
    }

    /// Remove commands due at `tick` and any whose tick has passed.
    ///
    /// Future commands stay queued in their original order.
    pub fn take_due(&mut self, tick: u32) -> DueCommands {
        let mut out = DueCommands::default();
        let mut keep = Vec::with_capacity(self.pending.len());
        for cmd in self.pending.drain(..) {
            if cmd.tick == tick {
                out.due.push(cmd);
            } else if (cmd.tick.wrapping_sub(tick) as i32) < 0 {
                out.stale.push(cmd);
            } else {
                keep.push(cmd);
            }
        }
        self.pending = keep;
        out
    }

    /// Forget the last move so the next identical input is not debounced.
    pub fn reset_move_debounce(&mut self) {
        self.last_move = None;
    }

    /// Commands not yet taken, in dispatch order.
    pub fn pending(&self) -> &[Command] {
        &self.pending
    }

    /// Number of pending commands.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The replay log.
    pub fn log(&self) -> &CommandLog {
        &self.log
    }
}

// =============================================================================
// TESTS
// =============================================================================
