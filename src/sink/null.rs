//! A sink that discards every record. Useful for benchmarking and for
//! producer-path tests that care about queue/backpressure behaviour but not
//! about an actual destination.

use crate::error::Result;
use crate::record::LogRecord;
use crate::sink::Sink;

#[derive(Debug, Default)]
pub struct NullSink {
    written: u64,
    flushes: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records passed to `write` so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Number of `flush` calls observed so far.
    pub fn flushes(&self) -> u64 {
        self.flushes
    }
}

impl Sink for NullSink {
    fn write(&mut self, record: LogRecord) -> Result<()> {
        self.written += 1;
        drop(record);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn close(&mut self) {}
}
