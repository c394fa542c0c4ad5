//! Log Recovery
//!
//! Replays the log on open and cuts off whatever a crash left half-written.

use std::fs::{self, OpenOptions};
use std::path::Path;

use tracing::warn;

use crate::error::Result;
use super::LogEntry;

/// Handles log recovery after a crash
pub struct LogRecovery;

/// Result of a recovery operation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Bytes dropped from the tail of the log
    pub bytes_discarded: u64,

    /// Last valid LSN (0 if the log is empty)
    pub last_lsn: u64,

    /// Whether the file was truncated
    pub was_truncated: bool,
}

impl LogRecovery {
    /// Recover entries from a log file
    ///
    /// This will:
    /// 1. Read entries front to back
    /// 2. Stop at the first torn or corrupt frame
    /// 3. Truncate the file to the end of the last valid frame
    /// 4. Return all valid entries in order
    ///
    /// A missing file recovers as empty.
    pub fn recover(path: &Path) -> Result<(Vec<LogEntry>, RecoveryResult)> {
        let (entries, result) = Self::scan(path)?;

        if result.was_truncated {
            let valid_len = fs::metadata(path)?.len() - result.bytes_discarded;
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        Ok((entries, result))
    }

    /// Verify integrity of a log file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        Self::scan(path).map(|(_, result)| result)
    }

    fn scan(path: &Path) -> Result<(Vec<LogEntry>, RecoveryResult)> {
        if !path.exists() {
            return Ok((Vec::new(), RecoveryResult::default()));
        }

        let bytes = fs::read(path)?;
        let mut entries = Vec::new();
        let mut offset = 0usize;

        while offset < bytes.len() {
            match LogEntry::decode(&bytes[offset..]) {
                Ok(Some((entry, consumed))) => {
                    offset += consumed;
                    entries.push(entry);
                }
                Ok(None) => {
                    warn!(
                        path = %path.display(),
                        offset,
                        "torn entry at log tail"
                    );
                    break;
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        offset,
                        error = %e,
                        "corrupt log entry, discarding remainder"
                    );
                    break;
                }
            }
        }

        let bytes_discarded = (bytes.len() - offset) as u64;
        let result = RecoveryResult {
            entries_recovered: entries.len() as u64,
            bytes_discarded,
            last_lsn: entries.last().map(|e| e.lsn).unwrap_or(0),
            was_truncated: bytes_discarded > 0,
        };

        Ok((entries, result))
    }
}
