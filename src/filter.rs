//! Bloom filter for address membership testing.
//!
//! Sized from the standard relations for a target false-positive rate:
//!   m = -n * ln(p) / (ln 2)^2      bits
//!   k = (m / n) * ln 2             hash functions
//!
//! Never false-negative. Load once, then query from any number of threads
//! without synchronization: the bit array is immutable after load.

use std::f64::consts::LN_2;
use std::hash::Hasher;

use fxhash::FxHasher;
use log::warn;

/// Second-hash seed for double hashing. Arbitrary odd constant.
const H2_SEED: u64 = 0x9e3779b97f4a7c15;

pub struct BloomFilter {
    bits: Vec<u64>,
    /// Bit-array length m.
    num_bits: u64,
    /// Hash-function count k.
    num_hashes: u32,
    inserted: usize,
    max_elements: usize,
    error_rate: f64,
}

impl BloomFilter {
    /// Create an empty filter sized for `max_elements` entries at
    /// `error_rate` false-positive probability.
    pub fn new(max_elements: usize, error_rate: f64) -> Self {
        let n = max_elements.max(1) as f64;
        let p = error_rate.clamp(1e-12, 0.5);

        let m = (-n * p.ln() / (LN_2 * LN_2)).ceil() as u64;
        let m = m.max(64);
        let k = ((m as f64 / n) * LN_2).round() as u32;
        let k = k.clamp(1, 32);

        Self {
            bits: vec![0u64; (m as usize + 63) / 64],
            num_bits: m,
            num_hashes: k,
            inserted: 0,
            max_elements,
            error_rate,
        }
    }

    /// Two independent base hashes; probe i uses h1 + i*h2 (mod m).
    #[inline]
    fn base_hashes(item: &str) -> (u64, u64) {
        let mut hasher = FxHasher::default();
        hasher.write(item.as_bytes());
        let h1 = hasher.finish();

        let mut hasher = FxHasher::default();
        hasher.write_u64(H2_SEED);
        hasher.write(item.as_bytes());
        // Force odd so successive probes never collapse onto one index
        let h2 = hasher.finish() | 1;
        (h1, h2)
    }

    /// Insert during the load phase. Duplicate inserts are harmless no-ops
    /// on the bit array. Exceeding capacity degrades the false-positive
    /// guarantee; it is warned about once, not treated as an error.
    pub fn insert(&mut self, item: &str) {
        let (h1, h2) = Self::base_hashes(item);
        for i in 0..self.num_hashes as u64 {
            let bit = h1.wrapping_add(i.wrapping_mul(h2)) % self.num_bits;
            self.bits[(bit / 64) as usize] |= 1u64 << (bit % 64);
        }
        self.inserted += 1;
        if self.inserted == self.max_elements + 1 {
            warn!(
                "bloom filter oversubscribed: {} elements inserted, sized for {}; \
                 false-positive rate will exceed {}",
                self.inserted, self.max_elements, self.error_rate
            );
        }
    }

    /// Membership test. `false` is always correct; `true` may be a false
    /// positive bounded by the configured error rate while the filter is
    /// within capacity. Takes `&self`: safe for unsynchronized concurrent
    /// readers once loading is done.
    #[inline]
    pub fn query(&self, item: &str) -> bool {
        let (h1, h2) = Self::base_hashes(item);
        for i in 0..self.num_hashes as u64 {
            let bit = h1.wrapping_add(i.wrapping_mul(h2)) % self.num_bits;
            if self.bits[(bit / 64) as usize] & (1u64 << (bit % 64)) == 0 {
                return false;
            }
        }
        true
    }

    pub fn inserted(&self) -> usize {
        self.inserted
    }

    pub fn max_elements(&self) -> usize {
        self.max_elements
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Filter memory footprint in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.bits.len() * 8
    }
}
