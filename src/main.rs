use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::error;

use keysweep::cli::{Args, Mode};
use keysweep::error::Result;
use keysweep::hitlog::HitLogger;
use keysweep::keygen::select_backend;
use keysweep::scan::{format_num, format_speed, ScanConfig, Scanner};
use keysweep::selftest::run_self_test;
use keysweep::service::{BatchRequest, KeyService};
use keysweep::targets::load_database;

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let result = match args.mode {
        Mode::Single => run_single(&args),
        Mode::Batch => run_batch(&args),
        Mode::Continuous => run_continuous(&args),
        Mode::SelfTest => {
            return if run_self_test() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("[!] {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_single(_args: &Args) -> Result<()> {
    let service = KeyService::new(select_backend(None));
    let material = service.generate_key()?;
    println!("{}", serde_json::to_string_pretty(&material)?);
    Ok(())
}

fn run_batch(args: &Args) -> Result<()> {
    let service = KeyService::new(select_backend(None));
    println!("[*] Generating {} keys...", format_num(args.count as u64));
    let summary = service.generate_batch(&BatchRequest {
        count: args.count,
        num_threads: args.workers(),
        use_gpu: false,
    })?;

    println!(
        "[+] {} keys in {:.3}s ({}) via {}",
        format_num(summary.total_keys as u64),
        summary.generation_secs,
        format_speed(summary.keys_per_second),
        summary.method
    );
    for sample in &summary.sample_results {
        println!(
            "    {} | {} | {}",
            sample.private_key, sample.btc_address, sample.eth_address
        );
    }
    Ok(())
}

fn run_continuous(args: &Args) -> Result<()> {
    let backend = select_backend(None);
    let filter = Arc::new(load_database(
        &args.database,
        args.max_elements,
        args.error_rate,
    )?);
    let logger = Arc::new(HitLogger::open(&args.hit_log)?);

    println!("[*] keysweep - continuous scan");
    println!(
        "    database: {} ({} addresses, {:.1} MB filter)",
        args.database,
        format_num(filter.inserted() as u64),
        filter.memory_bytes() as f64 / 1e6
    );
    println!("    backend: {} | batch: {} | workers: {}", backend.name(), args.batch_size, args.workers());
    println!("    hits -> {}", args.hit_log);
    println!("[>] Scanning... (Ctrl+C to stop)\n");

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_sig = shutdown.clone();
    ctrlc::set_handler(move || {
        println!("\n[!] Stopping...");
        shutdown_sig.store(true, Ordering::SeqCst);
    })
    .ok();

    let interval = if args.interval > 0.0 {
        Some(Duration::from_secs_f64(args.interval))
    } else {
        None
    };
    let scanner = Scanner::new(
        backend,
        filter,
        logger,
        ScanConfig {
            batch_size: args.batch_size,
            workers: args.workers(),
            interval,
            ..ScanConfig::default()
        },
    );

    let stats = scanner.run(shutdown)?;
    println!(
        "\n[Done] {} keys | {} hits | {}",
        format_num(stats.keys_generated),
        stats.hits,
        format_speed(stats.keys_per_second())
    );
    Ok(())
}
