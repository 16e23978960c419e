//! Deterministic Random Number Generator
//!
//! Uses a 32-bit Xorshift generator advanced exactly once per tick.
//! Given the same seed, produces identical sequence on all platforms.

use serde::{Deserialize, Serialize};

/// Replacement for an all-zero state. Zero is absorbing for xorshift and
/// must never persist.
pub const RNG_ZERO_REMAP: u32 = 0x6D2B_79F5;

/// One xorshift32 mixing round.
///
/// A zero input is remapped to [`RNG_ZERO_REMAP`] before mixing, so the
/// output is never zero.
#[inline]
pub const fn xorshift32(x: u32) -> u32 {
    let mut v = if x == 0 { RNG_ZERO_REMAP } else { x };
    v ^= v << 13;
    v ^= v >> 17;
    v ^= v << 5;
    v
}

/// Deterministic PRNG carried inside the simulation state.
///
/// Serializes as its bare `u32` state so snapshots stay field-for-field.
///
/// # Example
///
/// ```
/// use worldsim::core::rng::SimRng;
///
/// let mut rng = SimRng::new(0x1234);
/// assert_eq!(rng.next_u32(), 1251275255); // Always the same!
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimRng {
    state: u32,
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SimRng {
    /// Create a new generator from a seed.
    ///
    /// A zero seed is replaced by [`RNG_ZERO_REMAP`] so the non-zero
    /// invariant holds from tick 0.
    pub const fn new(seed: u32) -> Self {
        let state = if seed == 0 { RNG_ZERO_REMAP } else { seed };
        Self { state }
    }

    /// Advance once and return the new state.
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        self.state = xorshift32(self.state);
        self.state
    }

    /// Low bit of the current state.
    #[inline]
    pub fn low_bit(&self) -> u32 {
        self.state & 1
    }

    /// Get current state (for checkpointing/debugging).
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Restore from saved state.
    ///
    /// Returns `false` and leaves the generator unchanged for a zero state.
    pub fn set_state(&mut self, state: u32) -> bool {
        if state == 0 {
            return false;
        }
        self.state = state;
        true
    }
}

// =============================================================================
// TESTS
// =============================================================================
