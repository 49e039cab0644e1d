//! Key generation backends.
//!
//! The scan loop only sees the `KeyBackend` trait. The internal CSPRNG
//! backend is the mandatory default; an accelerated collaborator (if one is
//! supplied) satisfies the same contract and changes nothing but throughput.

use std::sync::Arc;
use std::time::Instant;

use log::info;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::crypto::is_valid_private_key;
use crate::error::{Result, SweepError};
use crate::types::PrivateKey;

/// Redraw budget per key. An invalid scalar from a uniform 256-bit draw is
/// a ~2^-128 event; hitting the budget means the RNG is broken.
const MAX_REDRAWS: u32 = 10_000;

/// Capability surface of any key generator, internal or accelerated.
pub trait KeyBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// One uniformly random scalar in [1, N-1].
    fn generate(&self) -> Result<PrivateKey>;

    /// `count` statistically independent keys. `workers` controls internal
    /// parallelism only; it must not change the output distribution.
    fn generate_batch(&self, count: usize, workers: usize) -> Result<Vec<PrivateKey>>;

    /// Measured throughput in keys/sec over a `count`-key run.
    fn benchmark(&self, count: usize) -> Result<f64> {
        let start = Instant::now();
        self.generate_batch(count, rayon::current_num_threads())?;
        Ok(count as f64 / start.elapsed().as_secs_f64())
    }
}

/// Internal generator drawing from the OS entropy source.
pub struct RngBackend;

impl RngBackend {
    fn draw_one(rng: &mut OsRng) -> Result<PrivateKey> {
        let mut bytes = [0u8; 32];
        for _ in 0..MAX_REDRAWS {
            rng.try_fill_bytes(&mut bytes)
                .map_err(|e| SweepError::Entropy(e.to_string()))?;
            if is_valid_private_key(&bytes) {
                return PrivateKey::from_bytes(bytes);
            }
            // Scalar was 0 or >= N; redraw rather than emit a bad key
        }
        Err(SweepError::Entropy(format!(
            "no valid scalar after {} draws",
            MAX_REDRAWS
        )))
    }
}

impl KeyBackend for RngBackend {
    fn name(&self) -> &'static str {
        "CPU"
    }

    fn generate(&self) -> Result<PrivateKey> {
        Self::draw_one(&mut OsRng)
    }

    fn generate_batch(&self, count: usize, workers: usize) -> Result<Vec<PrivateKey>> {
        // Dedicated pool so `workers` only affects parallelism, never output.
        // OsRng is per-draw; workers share no state and need no sync.
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()
            .map_err(|e| {
                SweepError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
            })?;

        pool.install(|| {
            use rayon::prelude::*;
            (0..count)
                .into_par_iter()
                .map(|_| Self::draw_one(&mut OsRng))
                .collect()
        })
    }
}

/// Pick the key backend: the externally supplied accelerator when present,
/// the internal CSPRNG otherwise. The fallback is silent by design; absence
/// of the accelerator is not a user-visible error.
pub fn select_backend(external: Option<Arc<dyn KeyBackend>>) -> Arc<dyn KeyBackend> {
    match external {
        Some(backend) => {
            info!("using accelerated key backend: {}", backend.name());
            backend
        }
        None => Arc::new(RngBackend),
    }
}
