//! Log entry definitions
//!
//! Defines the structure and framing of individual log entries.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TableError};

/// Frame header: LSN (8) + CRC (4) + payload length (4)
pub const HEADER_SIZE: usize = 16;

/// Largest payload accepted when decoding (64 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 64 * 1024 * 1024;

/// A single entry in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Log Sequence Number - monotonically increasing within one log file
    pub lsn: u64,

    /// The mutation this entry records
    pub operation: Operation,
}

/// Mutations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Store a value at a key
    Set { key: String, value: String },

    /// Remove a key
    Remove { key: String },

    /// Remove every key
    Clear,
}

impl LogEntry {
    pub fn new(lsn: u64, operation: Operation) -> Self {
        Self { lsn, operation }
    }

    /// Encode to the on-disk frame
    ///
    /// ```text
    /// ┌─────────┬─────────┬────────┬──────────────────┐
    /// │ LSN (8) │ CRC (4) │Len (4) │ bincode(payload) │
    /// └─────────┴─────────┴────────┴──────────────────┘
    /// ```
    pub fn encode(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(&self.operation)?;
        let crc = crc32fast::hash(&payload);

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&self.lsn.to_be_bytes());
        frame.extend_from_slice(&crc.to_be_bytes());
        frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        frame.extend_from_slice(&payload);
        Ok(frame)
    }

    /// Decode one frame from the front of `bytes`
    ///
    /// Returns:
    /// - `Ok(Some((entry, consumed)))` — a complete, valid frame
    /// - `Ok(None)` — not enough bytes for a full frame (clean end or torn tail)
    /// - `Err(_)` — the frame is complete but corrupt
    pub fn decode(bytes: &[u8]) -> Result<Option<(Self, usize)>> {
        if bytes.len() < HEADER_SIZE {
            return Ok(None);
        }

        let lsn = u64::from_be_bytes(read_array(&bytes[0..8]));
        let expected_crc = u32::from_be_bytes(read_array(&bytes[8..12]));
        let len = u32::from_be_bytes(read_array(&bytes[12..16]));

        if len > MAX_PAYLOAD_SIZE {
            return Err(TableError::LogCorruption(format!(
                "entry at LSN {} claims {} byte payload (max {})",
                lsn, len, MAX_PAYLOAD_SIZE
            )));
        }

        let end = HEADER_SIZE + len as usize;
        if bytes.len() < end {
            return Ok(None);
        }

        let payload = &bytes[HEADER_SIZE..end];
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            return Err(TableError::LogCorruption(format!(
                "checksum mismatch at LSN {}: expected {:#010x}, computed {:#010x}",
                lsn, expected_crc, actual_crc
            )));
        }

        let operation: Operation = bincode::deserialize(payload)?;
        Ok(Some((Self { lsn, operation }, end)))
    }
}

fn read_array<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}
