//! Replay artefacts on disk.
//!
//! - Command logs: raw concatenated 16-byte wire records
//! - Checkpoint CSV: `tick,hash` header, then one `tick,<16 hex>` per line

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use crate::core::hash::{fingerprint_hex, parse_fingerprint_hex};
use crate::game::command::{decode_stream, encode_stream, CodecError, Command, DecodedStream};
use crate::replay::verify::Checkpoint;

/// CSV header line.
pub const CHECKPOINT_HEADER: &str = "tick,hash";

/// Errors reading or writing replay artefacts.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Filesystem or stream failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Command log is not a valid record stream
    #[error("command log: {0}")]
    Codec(#[from] CodecError),

    /// Malformed checkpoint CSV
    #[error("checkpoint csv line {line}: {reason}")]
    Csv { line: usize, reason: &'static str },
}

/// Write a command log file.
pub fn write_command_log(path: impl AsRef<Path>, commands: &[Command]) -> Result<(), LogError> {
    fs::write(path, encode_stream(commands))?;
    Ok(())
}

/// Read a command log file.
pub fn read_command_log(path: impl AsRef<Path>) -> Result<DecodedStream, LogError> {
    let mut bytes = Vec::new();
    fs::File::open(path)?.read_to_end(&mut bytes)?;
    Ok(decode_stream(&bytes)?)
}

/// Write checkpoints as CSV.
pub fn write_checkpoints<W: Write>(mut out: W, checkpoints: &[Checkpoint]) -> Result<(), LogError> {
    writeln!(out, "{CHECKPOINT_HEADER}")?;
    for cp in checkpoints {
        writeln!(out, "{},{}", cp.tick, fingerprint_hex(cp.hash))?;
    }
    out.flush()?;
    Ok(())
}

/// Read checkpoints from CSV.
pub fn read_checkpoints<R: Read>(input: R) -> Result<Vec<Checkpoint>, LogError> {
    let mut lines = BufReader::new(input).lines();

    match lines.next().transpose()? {
        Some(header) if header.trim_end() == CHECKPOINT_HEADER => {}
        _ => return Err(LogError::Csv { line: 1, reason: "missing header" }),
    }

    let mut out = Vec::new();
    for (i, line) in lines.enumerate() {
        let line_no = i + 2;
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let (tick, hash) = line.split_once(',').ok_or(LogError::Csv {
            line: line_no,
            reason: "expected two fields",
        })?;
        let tick = tick.parse().map_err(|_| LogError::Csv {
            line: line_no,
            reason: "bad tick",
        })?;
        let hash = parse_fingerprint_hex(hash).ok_or(LogError::Csv {
            line: line_no,
            reason: "bad hash",
        })?;
        out.push(Checkpoint { tick, hash });
    }
    Ok(out)
}

/// Write checkpoints to a CSV file.
pub fn write_checkpoint_file(path: impl AsRef<Path>, checkpoints: &[Checkpoint]) -> Result<(), LogError> {
    let file = fs::File::create(path)?;
    write_checkpoints(std::io::BufWriter::new(file), checkpoints)
}
