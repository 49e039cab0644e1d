//! CLI surface.

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Generate one key and print its addresses.
    Single,
    /// Generate a batch of keys and report throughput.
    Batch,
    /// Scan continuously until interrupted.
    Continuous,
    /// Run the startup self-test and exit.
    SelfTest,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "keysweep", version, about = "Continuous BTC/ETH key scanner")]
pub struct Args {
    /// Operating mode
    #[arg(long, value_enum, default_value = "continuous")]
    pub mode: Mode,

    /// Keys generated per batch
    #[arg(long, default_value_t = 10_000)]
    pub batch_size: usize,

    /// Key-generation worker threads (default: all cores)
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    /// Seconds to sleep between batches (0 = no throttle)
    #[arg(long, default_value_t = 0.0)]
    pub interval: f64,

    /// Keys to generate in batch mode
    #[arg(long, default_value_t = 1_000)]
    pub count: usize,

    /// Address database file, one address per line
    #[arg(long, default_value = "addresses.txt")]
    pub database: String,

    /// Append-only hit log destination
    #[arg(long, default_value = "hits.txt")]
    pub hit_log: String,

    /// Bloom filter capacity
    #[arg(long, default_value_t = 1_000_000)]
    pub max_elements: usize,

    /// Bloom filter target false-positive rate
    #[arg(long, default_value_t = 0.001)]
    pub error_rate: f64,
}

impl Args {
    pub fn workers(&self) -> usize {
        self.threads.unwrap_or_else(rayon::current_num_threads)
    }
}
