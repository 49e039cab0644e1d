//! keysweep: continuous BTC/ETH private-key scanner.
//!
//! Pipeline: key backend -> address derivation -> Bloom filter query ->
//! append-only hit log. The filter is bulk-loaded once from an address
//! database and then queried lock-free from any number of workers.

pub mod address;
pub mod cli;
pub mod crypto;
pub mod error;
pub mod filter;
pub mod hitlog;
pub mod keygen;
pub mod scan;
pub mod selftest;
pub mod service;
pub mod targets;
pub mod types;

pub use error::{Result, SweepError};
