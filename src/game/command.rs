//! Commands and the 16-byte Wire Record
//!
//! Layout (little-endian):
//!
//! ```text
//! [0..4)   tick  u32
//! [4]      kind  u8
//! [5..8)   reserved (zero)
//! [8..12)  arg0  i32
//! [12..16) arg1  i32
//! ```
//!
//! This layout is a wire contract shared by persisted command logs and any
//! cross-process transport. It must never change.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Size of one encoded command record in bytes.
pub const COMMAND_WIRE_SIZE: usize = 16;

// =============================================================================
// COMMAND KIND
// =============================================================================

/// Closed set of command kinds, tagged with their wire value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CommandKind {
    /// Relative avatar step: arg0 = dx, arg1 = dy
    MoveAvatar = 1,
    /// Use whatever is in the facing cell: arg0 = dx, arg1 = dy
    UseFacing = 2,
    /// Use a door or furniture at cell (arg0, arg1)
    UseAtCell = 3,
    /// Inspect the top object at a cell
    LookAtCell = 4,
    /// Address the entity at a cell
    TalkAtCell = 5,
    /// Pick up the top pickup at a cell
    GetAtCell = 6,
    /// Range-checked, no game effect yet
    AttackAtCell = 7,
    /// Range-checked, no game effect yet
    CastAtCell = 8,
    /// Drop one inventory item near a cell
    DropAtCell = 9,
    /// Range-checked, no game effect yet
    MoveAtCell = 10,
    /// `UseAtCell` issued from the verb menu
    UseVerbAtCell = 11,
}

impl CommandKind {
    /// All kinds in wire order.
    pub const ALL: [CommandKind; 11] = [
        CommandKind::MoveAvatar,
        CommandKind::UseFacing,
        CommandKind::UseAtCell,
        CommandKind::LookAtCell,
        CommandKind::TalkAtCell,
        CommandKind::GetAtCell,
        CommandKind::AttackAtCell,
        CommandKind::CastAtCell,
        CommandKind::DropAtCell,
        CommandKind::MoveAtCell,
        CommandKind::UseVerbAtCell,
    ];

    /// Wire tag.
    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Map a wire tag back to a kind.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            1 => CommandKind::MoveAvatar,
            2 => CommandKind::UseFacing,
            3 => CommandKind::UseAtCell,
            4 => CommandKind::LookAtCell,
            5 => CommandKind::TalkAtCell,
            6 => CommandKind::GetAtCell,
            7 => CommandKind::AttackAtCell,
            8 => CommandKind::CastAtCell,
            9 => CommandKind::DropAtCell,
            10 => CommandKind::MoveAtCell,
            11 => CommandKind::UseVerbAtCell,
            _ => return None,
        })
    }

    /// Whether args are a direction delta rather than an absolute cell.
    #[inline]
    pub const fn is_relative(self) -> bool {
        matches!(self, CommandKind::MoveAvatar | CommandKind::UseFacing)
    }
}

// =============================================================================
// COMMAND
// =============================================================================

/// A single command targeted at one tick. Immutable once issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command {
    /// Tick this command applies at
    pub tick: u32,
    /// What to do
    pub kind: CommandKind,
    /// dx for relative kinds, x for cell kinds
    pub arg0: i32,
    /// dy for relative kinds, y for cell kinds
    pub arg1: i32,
}

impl Command {
    /// Build a command from raw parts.
    pub const fn new(tick: u32, kind: CommandKind, arg0: i32, arg1: i32) -> Self {
        Self {
            tick,
            kind,
            arg0,
            arg1,
        }
    }

    /// Relative avatar move.
    pub const fn move_avatar(tick: u32, dx: i32, dy: i32) -> Self {
        Self::new(tick, CommandKind::MoveAvatar, dx, dy)
    }

    /// Use the cell at `(dx, dy)` from the avatar.
    pub const fn use_facing(tick: u32, dx: i32, dy: i32) -> Self {
        Self::new(tick, CommandKind::UseFacing, dx, dy)
    }

    /// A verb aimed at an absolute cell.
    pub const fn at_cell(tick: u32, kind: CommandKind, x: i32, y: i32) -> Self {
        Self::new(tick, kind, x, y)
    }

    /// Whether this is a relative avatar move.
    #[inline]
    pub const fn is_move(&self) -> bool {
        matches!(self.kind, CommandKind::MoveAvatar)
    }

    /// Encode to the 16-byte wire record.
    pub fn encode(&self) -> [u8; COMMAND_WIRE_SIZE] {
        let mut out = [0u8; COMMAND_WIRE_SIZE];
        out[0..4].copy_from_slice(&self.tick.to_le_bytes());
        out[4] = self.kind.tag();
        out[8..12].copy_from_slice(&self.arg0.to_le_bytes());
        out[12..16].copy_from_slice(&self.arg1.to_le_bytes());
        out
    }

    /// Decode one record from the front of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let record: &[u8; COMMAND_WIRE_SIZE] = bytes
            .get(..COMMAND_WIRE_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(CodecError::TooShort { len: bytes.len() })?;
        let raw = RawRecord::read(record);
        let kind = CommandKind::from_tag(raw.tag).ok_or(CodecError::UnknownKind(raw.tag))?;
        Ok(Self::new(raw.tick, kind, raw.arg0, raw.arg1))
    }
}

/// Fields of a record before the kind tag is validated.
struct RawRecord {
    tick: u32,
    tag: u8,
    arg0: i32,
    arg1: i32,
}

impl RawRecord {
    fn read(b: &[u8; COMMAND_WIRE_SIZE]) -> Self {
        Self {
            tick: u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            tag: b[4],
            arg0: i32::from_le_bytes([b[8], b[9], b[10], b[11]]),
            arg1: i32::from_le_bytes([b[12], b[13], b[14], b[15]]),
        }
    }
}

// =============================================================================
// STREAMS
// =============================================================================

/// Codec failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Fewer than 16 bytes supplied
    #[error("record too short: {len} bytes, need 16")]
    TooShort { len: usize },

    /// Kind byte outside 1..=11
    #[error("unknown command kind tag {0}")]
    UnknownKind(u8),

    /// Stream has a partial trailing record
    #[error("stream length {len} is not a multiple of 16")]
    Misaligned { len: usize },

    /// More records than the destination can hold
    #[error("stream holds {records} records, capacity is {capacity}")]
    CapacityExceeded { records: usize, capacity: usize },
}

/// Result of decoding a record stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedStream {
    /// Decoded commands in stream order
    pub commands: Vec<Command>,
    /// Records skipped because their kind tag is unmapped
    pub skipped: usize,
}

/// Decode a concatenation of wire records.
///
/// Records with an unmapped kind are skipped and counted.
pub fn decode_stream(bytes: &[u8]) -> Result<DecodedStream, CodecError> {
    if bytes.len() % COMMAND_WIRE_SIZE != 0 {
        return Err(CodecError::Misaligned { len: bytes.len() });
    }

    let mut out = DecodedStream {
        commands: Vec::with_capacity(bytes.len() / COMMAND_WIRE_SIZE),
        skipped: 0,
    };

    for (i, chunk) in bytes.chunks_exact(COMMAND_WIRE_SIZE).enumerate() {
        match Command::decode(chunk) {
            Ok(cmd) => out.commands.push(cmd),
            Err(CodecError::UnknownKind(tag)) => {
                warn!(record = i, tag, "skipping command with unknown kind");
                out.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(out)
}

/// Decode a stream into a bounded buffer of `capacity` records.
pub fn decode_stream_into(bytes: &[u8], capacity: usize) -> Result<DecodedStream, CodecError> {
    let records = bytes.len() / COMMAND_WIRE_SIZE;
    if bytes.len() % COMMAND_WIRE_SIZE == 0 && records > capacity {
        return Err(CodecError::CapacityExceeded { records, capacity });
    }
    decode_stream(bytes)
}

/// Encode commands as a concatenation of wire records.
pub fn encode_stream(commands: &[Command]) -> Vec<u8> {
    let mut out = Vec::with_capacity(commands.len() * COMMAND_WIRE_SIZE);
    for cmd in commands {
        out.extend_from_slice(&cmd.encode());
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_layout() {
        let cmd = Command::new(0x0102_0304, CommandKind::DropAtCell, -2, 0x7fff_ffff);
        let bytes = cmd.encode();
        assert_eq!(&bytes[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(bytes[4], 9);
        assert_eq!(&bytes[5..8], &[0, 0, 0]);
        assert_eq!(&bytes[8..12], &[0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(&bytes[12..16], &[0xff, 0xff, 0xff, 0x7f]);
        assert_eq!(Command::decode(&bytes), Ok(cmd));
    }

    #[test]
    fn test_every_kind_round_trips() {
        for (i, kind) in CommandKind::ALL.iter().enumerate() {
            assert_eq!(kind.tag() as usize, i + 1);
            let cmd = Command::new(u32::MAX, *kind, i32::MIN, -1);
            assert_eq!(Command::decode(&cmd.encode()), Ok(cmd));
        }
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let mut bytes = Command::move_avatar(1, 1, 0).encode();
        bytes[4] = 0;
        assert_eq!(Command::decode(&bytes), Err(CodecError::UnknownKind(0)));
        bytes[4] = 12;
        assert_eq!(Command::decode(&bytes), Err(CodecError::UnknownKind(12)));
    }

    #[test]
    fn test_decode_short_record() {
        assert_eq!(
            Command::decode(&[0u8; 15]),
            Err(CodecError::TooShort { len: 15 })
        );
    }

    #[test]
    fn test_stream_skips_unknown_kinds() {
        let cmds = [
            Command::move_avatar(1, 1, 0),
            Command::at_cell(2, CommandKind::LookAtCell, 10, 11),
        ];
        let mut bytes = encode_stream(&cmds);
        let mut junk = Command::move_avatar(3, 0, 0).encode();
        junk[4] = 0xee;
        bytes.extend_from_slice(&junk);

        let decoded = decode_stream(&bytes).unwrap();
        assert_eq!(decoded.commands, cmds.to_vec());
        assert_eq!(decoded.skipped, 1);
    }

    #[test]
    fn test_stream_rejects_misaligned() {
        let bytes = vec![0u8; COMMAND_WIRE_SIZE + 3];
        assert_eq!(
            decode_stream(&bytes),
            Err(CodecError::Misaligned { len: 19 })
        );
    }

    #[test]
    fn test_stream_capacity() {
        let cmds = vec![Command::move_avatar(1, 0, 1); 3];
        let bytes = encode_stream(&cmds);
        assert!(decode_stream_into(&bytes, 3).is_ok());
        assert_eq!(
            decode_stream_into(&bytes, 2),
            Err(CodecError::CapacityExceeded {
                records: 3,
                capacity: 2
            })
        );
    }
}
