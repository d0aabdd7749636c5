//! alog - high-throughput asynchronous logging engine for latency-sensitive
//! server processes.
//!
//! A producer thread formats a record and enqueues it onto a bounded
//! lock-free ring buffer without ever blocking; a single dedicated consumer
//! thread drains the buffer and drives a [`Sink`] with adaptive backoff when
//! idle. See [`Logger`] for the facade most callers need.

pub mod config;
pub mod consumer;
pub mod constants;
pub mod error;
pub mod formatter;
pub mod internal_log;
pub mod logger;
pub mod queue;
pub mod record;
pub mod sink;

#[cfg(feature = "syslog-shim")]
pub mod syslog_shim;

pub use config::Config;
pub use error::{Error, Result};
pub use logger::{Logger, State, StatsSnapshot};
pub use record::Level;
pub use sink::{FileSink, NullSink, Sink};

/// Crate version, as reported by Cargo.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
