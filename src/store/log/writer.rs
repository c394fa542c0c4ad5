//! Log Writer
//!
//! Handles appending entries to the log file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::SyncStrategy;
use crate::error::Result;
use super::{LogEntry, Operation};

/// Appends entries to the log file
pub struct LogWriter {
    writer: BufWriter<File>,
    next_lsn: u64,
    sync_strategy: SyncStrategy,
    unsynced: usize,
}

impl LogWriter {
    /// Open a log file for appending, creating it if missing
    ///
    /// `next_lsn` is the LSN the next appended entry receives.
    pub fn open(path: &Path, sync_strategy: SyncStrategy, next_lsn: u64) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_file(file, sync_strategy, next_lsn))
    }

    /// Create a log file, discarding anything already at `path`
    pub fn create(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::from_file(file, sync_strategy, 1))
    }

    fn from_file(file: File, sync_strategy: SyncStrategy, next_lsn: u64) -> Self {
        Self {
            writer: BufWriter::new(file),
            next_lsn,
            sync_strategy,
            unsynced: 0,
        }
    }

    /// Append an operation, returning the LSN it was written under
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        let lsn = self.next_lsn;
        let frame = LogEntry::new(lsn, operation).encode()?;
        self.writer.write_all(&frame)?;
        self.next_lsn += 1;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNEntries { count } => self.unsynced >= count,
        };
        if due {
            self.sync()?;
        }

        Ok(lsn)
    }

    /// Flush buffered frames and fsync the file
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Flush buffered frames to the OS without fsync
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// LSN the next appended entry will receive
    pub fn next_lsn(&self) -> u64 {
        self.next_lsn
    }
}
