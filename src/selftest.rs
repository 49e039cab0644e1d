//! Startup self-test: regression vectors and an end-to-end round-trip.

use std::io::{stdout, Write};
use std::time::Instant;

use crate::address::{derive_btc, derive_eth};
use crate::filter::BloomFilter;
use crate::hitlog::HitLogger;
use crate::keygen::{KeyBackend, RngBackend};
use crate::types::{HitRecord, PrivateKey, Source};

/// Run all self-checks. Prints a short status per section, returns false on
/// the first failure.
pub fn run_self_test() -> bool {
    print!("[*] Self-test... ");
    stdout().flush().ok();
    let start = Instant::now();

    // Derivation vectors: scalar 1 is the curve generator point
    let vectors = [(
        "0000000000000000000000000000000000000000000000000000000000000001",
        "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm",
        "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf",
    )];
    for (priv_hex, btc, eth) in vectors {
        let key = match PrivateKey::from_hex(priv_hex) {
            Ok(k) => k,
            Err(_) => {
                println!("FAILED (key parse)");
                return false;
            }
        };
        if derive_btc(&key).ok().as_deref() != Some(btc) {
            println!("FAILED (btc vector)");
            return false;
        }
        if derive_eth(&key).ok().as_deref() != Some(eth) {
            println!("FAILED (eth vector)");
            return false;
        }
    }

    // Filter round-trip: inserted always found, fresh key almost surely not
    let mut filter = BloomFilter::new(1_000, 0.001);
    filter.insert("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa");
    filter.insert("0x742d35Cc6634C0532925a3b844Bc454e4438f44e");
    if !filter.query("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa")
        || !filter.query("0x742d35Cc6634C0532925a3b844Bc454e4438f44e")
    {
        println!("FAILED (filter true-positive)");
        return false;
    }
    if filter.query("1111111111111111111114oLvT2") {
        println!("FAILED (filter negative)");
        return false;
    }

    // Generator sanity
    let backend = RngBackend;
    let batch = match backend.generate_batch(64, 2) {
        Ok(b) => b,
        Err(e) => {
            println!("FAILED (keygen: {})", e);
            return false;
        }
    };
    if batch.len() != 64 {
        println!("FAILED (keygen batch length)");
        return false;
    }

    // Hit log round-trip against a temp destination
    let log_path =
        std::env::temp_dir().join(format!("keysweep-selftest-{}.txt", std::process::id()));
    let ok = match HitLogger::open(&log_path) {
        Ok(logger) => {
            let record = HitRecord::new(
                Source::Btc,
                batch[0],
                "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa".into(),
                "0x742d35cc6634c0532925a3b844bc454e4438f44e".into(),
            );
            logger.append(&record).is_ok() && logger.total_written() == 1
        }
        Err(_) => false,
    };
    std::fs::remove_file(&log_path).ok();
    if !ok {
        println!("FAILED (hitlog round-trip)");
        return false;
    }

    println!("OK ({:.2}s)", start.elapsed().as_secs_f64());
    true
}
