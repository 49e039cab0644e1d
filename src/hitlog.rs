//! Append-only hit persistence.
//!
//! Concurrent discoverers serialize through one mutex so no record is ever
//! interleaved, truncated, or lost. Every append is flushed and fsynced
//! before the lock is released; a slow disk stalls the discovering worker
//! (deliberate backpressure) but never drops a match.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use log::error;

use crate::error::{Result, SweepError};
use crate::types::HitRecord;

/// Write retries before escalating to a fatal error.
const MAX_RETRIES: u32 = 3;
/// Initial retry delay; doubles on each retry.
const RETRY_DELAY_MS: u64 = 10;

pub struct HitLogger {
    path: PathBuf,
    file: Mutex<File>,
    written: AtomicU64,
}

impl HitLogger {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            file: Mutex::new(file),
            written: AtomicU64::new(0),
        })
    }

    /// Append exactly one self-contained record. Retries transient write
    /// failures with doubling backoff; exhausting the retries is fatal,
    /// because silently losing a true positive is unacceptable.
    pub fn append(&self, record: &HitRecord) -> Result<()> {
        let line = record.to_log_line();
        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut delay = Duration::from_millis(RETRY_DELAY_MS);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match Self::write_line(&mut file, &line) {
                Ok(()) => {
                    self.written.fetch_add(1, Ordering::Relaxed);
                    return Ok(());
                }
                Err(e) if attempt <= MAX_RETRIES => {
                    error!(
                        "hit log write failed (attempt {}/{}): {}",
                        attempt,
                        MAX_RETRIES + 1,
                        e
                    );
                    thread::sleep(delay);
                    delay *= 2;
                }
                Err(e) => {
                    return Err(SweepError::LogWrite {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }

    fn write_line(file: &mut File, line: &str) -> std::io::Result<()> {
        writeln!(file, "{}", line)?;
        file.flush()?;
        // Force to physical disk before reporting success
        file.sync_all()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records durably persisted so far.
    pub fn total_written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }
}
