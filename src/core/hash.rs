//! State Hashing for Verification
//!
//! Provides deterministic 64-bit FNV-1a style hashing of simulation state for:
//! - Replay validation (checkpoint fingerprints)
//! - Snapshot round-trip checks
//! - Animation-phase drift detection
//!
//! Every value is folded as its unsigned 32-bit representation:
//! `h = (h ^ value) * FNV_PRIME mod 2^64`.

/// Fingerprint output type.
pub type Fingerprint = u64;

/// FNV-1a 64-bit offset basis.
pub const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Fold a single u32 into a running hash.
#[inline]
pub const fn mix_u32(h: u64, value: u32) -> u64 {
    (h ^ value as u64).wrapping_mul(FNV_PRIME)
}

/// Deterministic hasher for simulation state.
///
/// Order of updates is critical for determinism.
#[derive(Clone, Copy, Debug)]
pub struct StateHasher {
    h: u64,
}

impl Default for StateHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHasher {
    /// Create a new hasher seeded with the offset basis.
    pub const fn new() -> Self {
        Self { h: FNV_OFFSET }
    }

    /// Update with a u32 value.
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.h = mix_u32(self.h, value);
    }

    /// Update with an i32 value (two's complement reinterpretation).
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.update_u32(value as u32);
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u32(u32::from(value));
    }

    /// Update with a length or count.
    ///
    /// Counts above `u32::MAX` are truncated to their low 32 bits, matching
    /// the unsigned-32 normalization of every other folded value.
    #[inline]
    pub fn update_len(&mut self, len: usize) {
        self.update_u32(len as u32);
    }

    /// Update with every character of a string, one code unit at a time.
    pub fn update_str(&mut self, s: &str) {
        for unit in s.encode_utf16() {
            self.update_u32(u32::from(unit));
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> Fingerprint {
        self.h
    }
}

/// Render a fingerprint as 16 lowercase hex digits.
pub fn fingerprint_hex(value: Fingerprint) -> String {
    hex::encode(value.to_be_bytes())
}

/// Parse a 16-digit hex fingerprint.
pub fn parse_fingerprint_hex(s: &str) -> Option<Fingerprint> {
    let bytes = hex::decode(s.trim()).ok()?;
    let arr: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(arr))
}

// =============================================================================
// TESTS
// =============================================================================
