//! Tuning constants for the logging engine.
//!
//! Values are fixed by the engine's contract (see module-level docs in
//! `record`, `queue`, `consumer`, and `sink::file`), not free tuning knobs,
//! with the exception of `flush_interval_ms`/`format_buffer_size`/queue
//! capacity, which are configurable per [`crate::logger::Logger`] instance
//! and default to the values below.

/// Maximum payload length of a single `LogRecord`, in bytes.
pub const MAX_PAYLOAD: usize = 2048;

/// Default bounded queue capacity (must stay a power of two).
pub const DEFAULT_QUEUE_SIZE: usize = 1024;

/// Default interval between periodic sink flushes, in milliseconds.
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 200;

/// Default size of the producer's stack format buffer.
pub const DEFAULT_FORMAT_BUFFER_SIZE: usize = 2048;

/// Size of the file sink's write-coalescing buffer, in bytes.
pub const FILE_SINK_BUFFER_SIZE: usize = 4096;

/// Number of entries in the formatter's per-thread tid render cache.
pub const TID_CACHE_SIZE: usize = 128;

/// Below this attempt count, the consumer loop pure-spins.
pub const BACKOFF_SPIN_LIMIT: u32 = 10;

/// Below this attempt count (and at or above `BACKOFF_SPIN_LIMIT`), the
/// consumer loop yields to the scheduler instead of sleeping.
pub const BACKOFF_YIELD_LIMIT: u32 = 100;

/// Upper bound on the consumer's exponential backoff sleep, in microseconds.
pub const BACKOFF_MAX_SLEEP_MICROS: u64 = 8192;

/// Directory creation mode used when the file sink's destination directory
/// does not yet exist.
pub const LOG_DIR_MODE: u32 = 0o755;

/// File creation mode used when the file sink opens its destination.
pub const LOG_FILE_MODE: u32 = 0o644;

/// Sanity-checks the constants above against the invariants the rest of the
/// crate assumes.
pub fn validate_constants() -> std::result::Result<(), &'static str> {
    if !DEFAULT_QUEUE_SIZE.is_power_of_two() || DEFAULT_QUEUE_SIZE < 2 {
        return Err("DEFAULT_QUEUE_SIZE must be a power of two >= 2");
    }
    if MAX_PAYLOAD == 0 {
        return Err("MAX_PAYLOAD must be greater than 0");
    }
    if BACKOFF_SPIN_LIMIT >= BACKOFF_YIELD_LIMIT {
        return Err("BACKOFF_SPIN_LIMIT must be less than BACKOFF_YIELD_LIMIT");
    }
    if TID_CACHE_SIZE == 0 {
        return Err("TID_CACHE_SIZE must be greater than 0");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_internally_consistent() {
        assert!(validate_constants().is_ok());
    }

    #[test]
    fn queue_size_is_power_of_two() {
        assert!(DEFAULT_QUEUE_SIZE.is_power_of_two());
    }

    #[test]
    fn backoff_thresholds_are_ordered() {
        assert!(BACKOFF_SPIN_LIMIT < BACKOFF_YIELD_LIMIT);
    }
}
