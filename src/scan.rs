//! Continuous batch scan loop.
//!
//! A generator thread feeds key batches through a bounded channel; the
//! checking side derives both addresses per key, queries the filter, and
//! persists every positive before touching the counters. Cancellation is
//! cooperative and honored only at batch boundaries: once a batch has been
//! drawn it is fully derived, queried, and logged before the loop exits,
//! so the hit counter always equals the number of persisted log lines.

use std::io::{stdout, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::address::derive_pair;
use crate::error::{Result, SweepError};
use crate::filter::BloomFilter;
use crate::hitlog::HitLogger;
use crate::keygen::KeyBackend;
use crate::types::{HitRecord, PrivateKey, Source};

/// Batches in flight between generator and checker.
const PIPELINE_DEPTH: usize = 4;

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Keys drawn per iteration.
    pub batch_size: usize,
    /// Generation worker threads.
    pub workers: usize,
    /// Optional throttle between batches. Not correctness-bearing.
    pub interval: Option<Duration>,
    /// Progress line cadence.
    pub report_interval: Duration,
    /// Silence the progress display (tests).
    pub quiet: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: 10_000,
            workers: rayon::current_num_threads(),
            interval: None,
            report_interval: Duration::from_secs(2),
            quiet: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    pub keys_generated: u64,
    pub hits: u64,
    pub elapsed_secs: f64,
}

impl ScanStats {
    pub fn keys_per_second(&self) -> f64 {
        if self.elapsed_secs > 0.0 {
            self.keys_generated as f64 / self.elapsed_secs
        } else {
            0.0
        }
    }
}

pub struct Scanner {
    backend: Arc<dyn KeyBackend>,
    filter: Arc<BloomFilter>,
    logger: Arc<HitLogger>,
    config: ScanConfig,
    keys_generated: AtomicU64,
    hits: AtomicU64,
}

impl Scanner {
    pub fn new(
        backend: Arc<dyn KeyBackend>,
        filter: Arc<BloomFilter>,
        logger: Arc<HitLogger>,
        config: ScanConfig,
    ) -> Self {
        Self {
            backend,
            filter,
            logger,
            config,
            keys_generated: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    pub fn keys_generated(&self) -> u64 {
        self.keys_generated.load(Ordering::Relaxed)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Run until `shutdown` is set. Returns final counters; after the drain
    /// completes no further I/O happens.
    pub fn run(&self, shutdown: Arc<AtomicBool>) -> Result<ScanStats> {
        let start = Instant::now();
        let (tx, rx) = bounded::<Vec<PrivateKey>>(PIPELINE_DEPTH);
        let gen_error: Arc<Mutex<Option<SweepError>>> = Arc::new(Mutex::new(None));

        // Generator thread: draws batches until shutdown, then drops the
        // sender so the checker can drain everything already produced.
        let backend = self.backend.clone();
        let gen_shutdown = shutdown.clone();
        let gen_error_slot = gen_error.clone();
        let batch_size = self.config.batch_size;
        let workers = self.config.workers;
        let interval = self.config.interval;
        let generator = thread::spawn(move || {
            while !gen_shutdown.load(Ordering::Relaxed) {
                match backend.generate_batch(batch_size, workers) {
                    Ok(batch) => {
                        if tx.send(batch).is_err() {
                            break; // checker went away
                        }
                    }
                    Err(e) => {
                        // Entropy failure is fatal: stop the whole loop
                        *gen_error_slot.lock() = Some(e);
                        gen_shutdown.store(true, Ordering::SeqCst);
                        break;
                    }
                }
                if let Some(pause) = interval {
                    thread::sleep(pause);
                }
            }
        });

        // Checker: every batch received is fully processed, including the
        // ones still in the channel after shutdown.
        let mut last_report = Instant::now();
        let mut last_count = 0u64;
        let mut failure: Option<SweepError> = None;
        for batch in rx {
            if let Err(e) = self.process_batch(&batch) {
                shutdown.store(true, Ordering::SeqCst);
                failure = Some(e);
                break;
            }
            if !self.config.quiet && last_report.elapsed() >= self.config.report_interval {
                let count = self.keys_generated();
                let speed =
                    (count - last_count) as f64 / last_report.elapsed().as_secs_f64();
                print!(
                    "\r[>] {} keys | {} | {} hits | {}   ",
                    format_num(count),
                    format_speed(speed),
                    self.hits(),
                    format_time(start.elapsed().as_secs_f64())
                );
                stdout().flush().ok();
                last_report = Instant::now();
                last_count = count;
            }
        }

        generator.join().ok();

        if let Some(e) = failure {
            return Err(e);
        }
        if let Some(e) = gen_error.lock().take() {
            return Err(e);
        }
        Ok(ScanStats {
            keys_generated: self.keys_generated(),
            hits: self.hits(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Derive, query, and log one full batch. Hits are persisted before the
    /// hit counter moves; the key counter moves only once the whole batch
    /// is accounted for.
    fn process_batch(&self, batch: &[PrivateKey]) -> Result<()> {
        let nested: Vec<Vec<HitRecord>> = batch
            .par_iter()
            .map(|key| self.check_key(key))
            .collect::<Result<_>>()?;

        for record in nested.into_iter().flatten() {
            self.logger.append(&record)?;
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        self.keys_generated
            .fetch_add(batch.len() as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Both derived addresses queried against the filter. A key matching in
    /// both formats yields two records, tagged by source.
    fn check_key(&self, key: &PrivateKey) -> Result<Vec<HitRecord>> {
        let (btc, eth) = derive_pair(key)?;
        let mut found = Vec::new();
        if self.filter.query(&btc) {
            found.push(HitRecord::new(Source::Btc, *key, btc.clone(), eth.clone()));
        }
        if self.filter.query(&eth) {
            found.push(HitRecord::new(Source::Eth, *key, btc, eth));
        }
        Ok(found)
    }
}

pub fn format_num(n: u64) -> String {
    let s = n.to_string();
    let mut r = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            r.push(',');
        }
        r.push(c);
    }
    r.chars().rev().collect()
}

pub fn format_speed(s: f64) -> String {
    if s < 1_000.0 {
        format!("{:.0} keys/s", s)
    } else if s < 1_000_000.0 {
        format!("{:.1}K keys/s", s / 1_000.0)
    } else {
        format!("{:.2}M keys/s", s / 1_000_000.0)
    }
}

pub fn format_time(s: f64) -> String {
    if s < 60.0 {
        format!("{:.0}s", s)
    } else if s < 3600.0 {
        format!("{:.0}m{:.0}s", (s / 60.0).floor(), s % 60.0)
    } else {
        format!("{:.0}h{:.0}m", (s / 3600.0).floor(), ((s % 3600.0) / 60.0).floor())
    }
}
