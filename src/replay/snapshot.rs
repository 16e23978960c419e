//! State Snapshots
//!
//! Two encodings of the full [`SimulationState`]:
//!
//! - JSON (`serde_json`): self-describing, keyed maps use canonical key text
//! - Binary envelope: `b"WSIM"`, version byte, payload length (u32 LE),
//!   bincode payload, SHA-256 of the payload
//!
//! Decoding validates structure before returning. A failed restore never
//! touches the caller's state.

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::game::state::{InvalidState, SimulationState};

/// Envelope magic.
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"WSIM";

/// Current envelope version.
pub const SNAPSHOT_VERSION: u8 = 1;

const HEADER_LEN: usize = 4 + 1 + 4;
const CHECKSUM_LEN: usize = 32;

/// Snapshot decode failures.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Shorter than header plus checksum
    #[error("snapshot too short: {len} bytes")]
    TooShort { len: usize },

    /// Does not start with `WSIM`
    #[error("bad snapshot magic")]
    BadMagic,

    /// Envelope version this build cannot read
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u8),

    /// Declared payload length disagrees with the buffer
    #[error("payload length {declared} does not match {actual} available bytes")]
    LengthMismatch { declared: usize, actual: usize },

    /// SHA-256 over the payload does not match
    #[error("snapshot checksum mismatch")]
    ChecksumMismatch,

    /// bincode payload could not be decoded
    #[error("payload decode failed: {0}")]
    Decode(#[from] bincode::Error),

    /// JSON snapshot could not be read or written
    #[error("json snapshot failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Decoded state failed validation
    #[error("invalid state: {0}")]
    Invalid(#[from] InvalidState),
}

// =============================================================================
// JSON
// =============================================================================

/// Serialize to pretty JSON.
pub fn to_json(state: &SimulationState) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// Parse and validate a JSON snapshot.
pub fn from_json(text: &str) -> Result<SimulationState, SnapshotError> {
    let state: SimulationState = serde_json::from_str(text)?;
    state.validate()?;
    Ok(state)
}

// =============================================================================
// BINARY ENVELOPE
// =============================================================================

/// Encode into the checksummed binary envelope.
pub fn encode(state: &SimulationState) -> Result<Vec<u8>, SnapshotError> {
    let payload = bincode::serialize(state)?;
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + CHECKSUM_LEN);
    out.extend_from_slice(SNAPSHOT_MAGIC);
    out.push(SNAPSHOT_VERSION);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&Sha256::digest(&payload));
    Ok(out)
}

/// Decode and validate a binary envelope.
pub fn decode(bytes: &[u8]) -> Result<SimulationState, SnapshotError> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(SnapshotError::TooShort { len: bytes.len() });
    }
    if &bytes[0..4] != SNAPSHOT_MAGIC {
        return Err(SnapshotError::BadMagic);
    }
    if bytes[4] != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(bytes[4]));
    }

    let declared = u32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]) as usize;
    let actual = bytes.len() - HEADER_LEN - CHECKSUM_LEN;
    if declared != actual {
        return Err(SnapshotError::LengthMismatch { declared, actual });
    }

    let payload = &bytes[HEADER_LEN..HEADER_LEN + declared];
    let checksum = &bytes[HEADER_LEN + declared..];
    if Sha256::digest(payload).as_slice() != checksum {
        return Err(SnapshotError::ChecksumMismatch);
    }

    let state: SimulationState = bincode::deserialize(payload)?;
    state.validate()?;
    debug!(tick = state.tick, bytes = bytes.len(), "snapshot decoded");
    Ok(state)
}

/// Replace `state` with the decoded snapshot. On error `state` is untouched.
pub fn restore_into(state: &mut SimulationState, bytes: &[u8]) -> Result<(), SnapshotError> {
    *state = decode(bytes)?;
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::keys::{DoorKey, ItemKey, ObjectAnchor};
    use crate::game::state::{AvatarPose, SpawnedObject};

    fn busy_state() -> SimulationState {
        let mut s = SimulationState::default();
        s.tick = 77;
        s.commands_applied = 12;
        s.door_open_states.insert(DoorKey::new(0x135, 0x160, 0, 1));
        s.mark_removed(ObjectAnchor::new(0x133, 0x15f, 0, 2, 0x058), 40);
        s.add_item(ItemKey::new(0x058, 0));
        s.add_item(ItemKey::new(0x058, 0));
        s.spawned_world_objects.push(SpawnedObject {
            x: 1,
            y: 2,
            z: 0,
            type_id: 0x90,
            frame: 1,
            order: 3,
        });
        s.spawned_world_seq = 1;
        s.avatar_pose = AvatarPose::Sit;
        s.avatar_pose_anchor = Some(ObjectAnchor::new(0x131, 0x160, 0, 0, 0x0fc));
        s.avatar_pose_set_tick = 70;
        s
    }

    #[test]
    fn test_binary_preserves_fingerprint() {
        let state = busy_state();
        let bytes = encode(&state).unwrap();
        let back = decode(&bytes).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.compute_fingerprint(), state.compute_fingerprint());
    }

    #[test]
    fn test_json_uses_canonical_keys() {
        let state = busy_state();
        let json = to_json(&state).unwrap();
        assert!(json.contains("\"309,352,0,1\""));
        assert!(json.contains("\"0x058:0x00\": 2"));
        assert!(json.contains("\"sit\""));

        let back = from_json(&json).unwrap();
        assert_eq!(back.compute_fingerprint(), state.compute_fingerprint());
    }

    #[test]
    fn test_envelope_errors() {
        let bytes = encode(&busy_state()).unwrap();

        assert!(matches!(decode(&bytes[..10]), Err(SnapshotError::TooShort { .. })));

        let mut bad = bytes.clone();
        bad[0] = b'X';
        assert!(matches!(decode(&bad), Err(SnapshotError::BadMagic)));

        let mut bad = bytes.clone();
        bad[4] = 9;
        assert!(matches!(decode(&bad), Err(SnapshotError::UnsupportedVersion(9))));

        let mut bad = bytes.clone();
        bad.push(0);
        assert!(matches!(decode(&bad), Err(SnapshotError::LengthMismatch { .. })));

        let mut bad = bytes.clone();
        bad[HEADER_LEN] ^= 0xff;
        assert!(matches!(decode(&bad), Err(SnapshotError::ChecksumMismatch)));
    }

    #[test]
    fn test_invalid_state_rejected() {
        let mut state = busy_state();
        state.world.hour = 24;
        let bytes = encode(&state).unwrap();
        assert!(matches!(decode(&bytes), Err(SnapshotError::Invalid(_))));
    }

    #[test]
    fn test_restore_leaves_state_on_error() {
        let mut target = SimulationState::default();
        let before = target.clone();
        let mut bytes = encode(&busy_state()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 1;

        assert!(restore_into(&mut target, &bytes).is_err());
        assert_eq!(target, before);

        let good = encode(&busy_state()).unwrap();
        restore_into(&mut target, &good).unwrap();
        assert_eq!(target.tick, 77);
    }
}
