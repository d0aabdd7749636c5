//! The record type that crosses the queue boundary between producer and
//! consumer threads.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::MAX_PAYLOAD;

/// Severity of a [`LogRecord`]. Ordered so that `a >= b` means "at least as
/// severe as `b`", matching the level-gating comparison in the producer
/// fast path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Level {
    Debug = 1,
    Info = 2,
    Notice = 3,
    Warn = 4,
    Error = 5,
    Fatal = 6,
}

impl Level {
    /// Fixed six-character rendering used by the default pattern.
    pub fn as_fixed_width_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG ",
            Level::Info => "INFO  ",
            Level::Notice => "NOTICE",
            Level::Warn => "WARN  ",
            Level::Error => "ERROR ",
            Level::Fatal => "FATAL ",
        }
    }

    /// Parse a level name, case-insensitively, as accepted by the
    /// configuration surface (`debug`, `info`, `notice`, `warn`, `error`,
    /// `fatal`).
    pub fn parse(name: &str) -> Option<Level> {
        match name.to_ascii_lowercase().as_str() {
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "notice" => Some(Level::Notice),
            "warn" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "fatal" => Some(Level::Fatal),
            _ => None,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Level {
        match v {
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Notice,
            4 => Level::Warn,
            5 => Level::Error,
            _ => Level::Fatal,
        }
    }
}

/// Discriminates the three kinds of record that travel through the queue.
/// Only `Data` carries a payload; `Stop` and `Flush` are control records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Data,
    Stop,
    Flush,
}

/// Wall-clock capture time at second + microsecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub sec: i64,
    pub usec: i64,
}

impl Timestamp {
    /// Capture the current wall-clock time.
    pub fn now() -> Timestamp {
        let dur = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp {
            sec: dur.as_secs() as i64,
            usec: dur.subsec_micros() as i64,
        }
    }

    /// Milliseconds since the epoch, used by the consumer's flush-cadence
    /// comparisons.
    pub fn as_millis(self) -> i64 {
        self.sec * 1000 + self.usec / 1000
    }
}

/// The unit of work that travels from a producer thread, through the
/// bounded queue, to the consumer thread and its sink.
///
/// Ownership is exclusive throughout: a producer owns the record until
/// enqueue succeeds, after which the consumer owns it exclusively until the
/// sink releases it by dropping it.
#[derive(Debug)]
pub struct LogRecord {
    pub kind: RecordKind,
    pub level: Level,
    pub timestamp: Timestamp,
    pub thread_id: u64,
    pub payload: Box<[u8]>,
}

impl LogRecord {
    /// Construct a `DATA` record, truncating `payload` to `MAX_PAYLOAD`
    /// bytes if needed (truncation bookkeeping/counting is the caller's
    /// responsibility — the producer fast path truncates and counts before
    /// allocating the record).
    pub fn data(level: Level, thread_id: u64, payload: &[u8]) -> LogRecord {
        let len = payload.len().min(MAX_PAYLOAD);
        LogRecord {
            kind: RecordKind::Data,
            level,
            timestamp: Timestamp::now(),
            thread_id,
            payload: payload[..len].into(),
        }
    }

    /// Construct a control record (`STOP` or `FLUSH`); these never carry a
    /// payload.
    pub fn control(kind: RecordKind) -> LogRecord {
        debug_assert!(kind != RecordKind::Data);
        LogRecord {
            kind,
            level: Level::Info,
            timestamp: Timestamp::now(),
            thread_id: 0,
            payload: Box::new([]),
        }
    }
}
