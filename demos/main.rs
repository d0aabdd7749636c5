//! Demonstration entry point for the alog engine.
//!
//! Spins up a [`Logger`] with a file sink, fires a burst of records from
//! several producer threads, and reports the resulting counters.

use std::sync::Arc;
use std::time::Instant;

use alog::{alog, Level, Logger, StatsSnapshot};

const PRODUCERS: usize = 4;
const PER_PRODUCER: usize = 250_000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("alog - high-throughput asynchronous logging engine");
    println!("====================================================");

    let log_path = std::env::temp_dir().join("alog-demo.log");
    println!("\nWriting to: {}", log_path.display());

    let internal = Arc::new(alog::internal_log::InternalLog::from_env());
    let logger = Arc::new(Logger::new());
    logger.set_queue_size(1 << 16)?;
    logger.set_sink(Box::new(alog::FileSink::new(
        &log_path,
        alog::formatter::DEFAULT_PATTERN,
        internal,
    )))?;
    logger.start()?;

    println!("\nRunning {PRODUCERS} producer threads x {PER_PRODUCER} records each...");
    let start = Instant::now();

    let handles: Vec<_> = (0..PRODUCERS)
        .map(|id| {
            let logger = Arc::clone(&logger);
            std::thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    alog!(logger, Level::Info, "producer {} record {}", id, i);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().expect("producer thread panicked");
    }

    logger.flush();
    let elapsed = start.elapsed();
    println!("  produced in {elapsed:.2?}");

    let stats: StatsSnapshot = logger.stats();
    logger.stop();

    println!("\nCounters:");
    println!("  total:     {}", stats.total);
    println!("  dropped:   {}", stats.drop);
    println!("  errors:    {}", stats.err);
    println!("  truncated: {}", stats.trunc);

    Ok(())
}
