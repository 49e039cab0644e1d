//! Service context for request/response collaborators.
//!
//! The transport wrapper used to cache the filter and the accelerator in
//! process-wide globals; here both live in one injectable context so any
//! API layer on top stays race-free and testable in isolation. Reloading
//! the filter swaps a fully built replacement behind an `RwLock<Arc<_>>`,
//! so in-flight queries never observe a partially populated structure.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::address::derive_pair;
use crate::error::{Result, SweepError};
use crate::filter::BloomFilter;
use crate::keygen::KeyBackend;

/// Safety ceiling for one batch request.
pub const MAX_BATCH_KEYS: usize = 100_000;
/// Safety ceiling for one benchmark request.
pub const MAX_BENCHMARK_KEYS: usize = 1_000_000;
/// Large batches only derive addresses for this many sample keys.
const SAMPLE_KEYS: usize = 10;

/// Recognized options of a batch request.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRequest {
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default = "default_threads")]
    pub num_threads: usize,
    #[serde(default = "default_use_gpu")]
    pub use_gpu: bool,
}

/// Recognized options of a filter (re)load request.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadFilterRequest {
    pub addresses: Vec<String>,
    #[serde(default = "default_max_elements")]
    pub max_elements: usize,
    #[serde(default = "default_error_rate")]
    pub error_rate: f64,
}

fn default_count() -> usize {
    10
}
fn default_threads() -> usize {
    4
}
fn default_use_gpu() -> bool {
    true
}
fn default_max_elements() -> usize {
    1_000_000
}
fn default_error_rate() -> f64 {
    0.001
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub backend: &'static str,
    pub filter_loaded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyMaterial {
    pub private_key: String,
    pub btc_address: String,
    pub eth_address: String,
    pub method: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total_keys: usize,
    pub sample_results: Vec<KeyMaterial>,
    pub generation_secs: f64,
    pub keys_per_second: f64,
    pub method: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilterInfo {
    pub addresses_loaded: usize,
    pub max_elements: usize,
    pub error_rate: f64,
}

pub struct KeyService {
    backend: Arc<dyn KeyBackend>,
    filter: RwLock<Option<Arc<BloomFilter>>>,
}

impl KeyService {
    pub fn new(backend: Arc<dyn KeyBackend>) -> Self {
        Self {
            backend,
            filter: RwLock::new(None),
        }
    }

    pub fn with_filter(backend: Arc<dyn KeyBackend>, filter: Arc<BloomFilter>) -> Self {
        Self {
            backend,
            filter: RwLock::new(Some(filter)),
        }
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            backend: self.backend.name(),
            filter_loaded: self.filter.read().is_some(),
        }
    }

    pub fn generate_key(&self) -> Result<KeyMaterial> {
        let key = self.backend.generate()?;
        let (btc_address, eth_address) = derive_pair(&key)?;
        Ok(KeyMaterial {
            private_key: key.to_hex(),
            btc_address,
            eth_address,
            method: self.backend.name(),
        })
    }

    /// Batch generation with the safety ceiling enforced before any work.
    pub fn generate_batch(&self, request: &BatchRequest) -> Result<BatchSummary> {
        if request.count > MAX_BATCH_KEYS {
            return Err(SweepError::BatchTooLarge {
                requested: request.count,
                max: MAX_BATCH_KEYS,
            });
        }

        let start = Instant::now();
        let keys = self
            .backend
            .generate_batch(request.count, request.num_threads)?;
        let generation_secs = start.elapsed().as_secs_f64();

        let sample_results = keys
            .iter()
            .take(SAMPLE_KEYS)
            .map(|key| {
                let (btc_address, eth_address) = derive_pair(key)?;
                Ok(KeyMaterial {
                    private_key: key.to_hex(),
                    btc_address,
                    eth_address,
                    method: self.backend.name(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BatchSummary {
            total_keys: keys.len(),
            sample_results,
            generation_secs,
            keys_per_second: keys.len() as f64 / generation_secs.max(1e-9),
            method: self.backend.name(),
        })
    }

    pub fn benchmark(&self, count: usize) -> Result<f64> {
        if count > MAX_BENCHMARK_KEYS {
            return Err(SweepError::BatchTooLarge {
                requested: count,
                max: MAX_BENCHMARK_KEYS,
            });
        }
        self.backend.benchmark(count)
    }

    /// Build a complete replacement filter, then swap it in atomically.
    pub fn load_filter(&self, request: &LoadFilterRequest) -> FilterInfo {
        let mut filter = BloomFilter::new(request.max_elements, request.error_rate);
        for addr in &request.addresses {
            let addr = addr.trim();
            if !addr.is_empty() {
                filter.insert(addr);
            }
        }
        let info = FilterInfo {
            addresses_loaded: filter.inserted(),
            max_elements: request.max_elements,
            error_rate: request.error_rate,
        };
        *self.filter.write() = Some(Arc::new(filter));
        info
    }

    /// Membership results per address, or None when no filter is loaded.
    pub fn check_addresses(&self, addresses: &[String]) -> Option<HashMap<String, bool>> {
        let filter = self.filter.read().clone()?;
        Some(
            addresses
                .iter()
                .map(|addr| (addr.clone(), filter.query(addr.trim())))
                .collect(),
        )
    }

    /// Snapshot of the current filter for direct queriers.
    pub fn filter(&self) -> Option<Arc<BloomFilter>> {
        self.filter.read().clone()
    }
}
