//! Address database loading.
//!
//! The database is plain UTF-8 text, one address per line, both formats
//! mixed freely. Lines are whitespace-trimmed before insertion. A missing
//! file is recoverable: a small sample database is synthesized so the rest
//! of the system can run end to end.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::time::Instant;

use log::{info, warn};

use crate::error::Result;
use crate::filter::BloomFilter;

/// Bootstrap set used when the configured database file is absent.
const SAMPLE_ADDRESSES: &[&str] = &[
    "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",           // Bitcoin Genesis
    "0x742d35Cc6634C0532925a3b844Bc454e4438f44e",   // Ethereum DAO
    "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2",
    "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
    "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy",
];

/// Load the address database into a freshly sized Bloom filter.
///
/// Missing file: warn, write the sample database to the configured path,
/// and proceed with it.
pub fn load_database<P: AsRef<Path>>(
    path: P,
    max_elements: usize,
    error_rate: f64,
) -> Result<BloomFilter> {
    let path = path.as_ref();

    if !path.exists() {
        warn!(
            "address database not found: {}; creating sample database",
            path.display()
        );
        write_sample_database(path)?;
    }

    let start = Instant::now();
    let mut filter = BloomFilter::new(max_elements, error_rate);

    let reader = BufReader::new(File::open(path)?);
    for line in reader.lines() {
        let line = line?;
        let addr = line.trim();
        if addr.is_empty() {
            continue;
        }
        filter.insert(addr);
    }

    info!(
        "loaded {} addresses from {} in {:.2}s ({:.1} MB filter, k={})",
        filter.inserted(),
        path.display(),
        start.elapsed().as_secs_f64(),
        filter.memory_bytes() as f64 / 1e6,
        filter.num_hashes()
    );
    Ok(filter)
}

fn write_sample_database(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(path)?;
    for addr in SAMPLE_ADDRESSES {
        writeln!(file, "{}", addr)?;
    }
    info!(
        "created sample database with {} addresses at {}",
        SAMPLE_ADDRESSES.len(),
        path.display()
    );
    Ok(())
}
