//! Core deterministic primitives.
//!
//! All types in this module are designed for perfect cross-platform determinism.
//! Explicit fixed-width integers and wrapping arithmetic only.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::{xorshift32, SimRng, RNG_ZERO_REMAP};
pub use hash::{fingerprint_hex, Fingerprint, StateHasher};
