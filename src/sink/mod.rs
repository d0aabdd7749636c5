//! Sink abstraction: a destination for formatted log records.
//!
//! Modeled as a small capability trait — `write`/`flush`/`close` — rather
//! than an inheritance tree. A file sink composes a byte-output function
//! with a [`crate::formatter::Formatter`] rather than extending a
//! "formatter sink" base.

mod file;
mod null;

pub use file::FileSink;
pub use null::NullSink;

use crate::error::Result;
use crate::record::LogRecord;

/// A destination for formatted log records, owned exclusively by the
/// consumer thread once the logger has started.
pub trait Sink: Send {
    /// Write one record. Implementations take ownership of `record` and
    /// must not leak it regardless of outcome.
    fn write(&mut self, record: LogRecord) -> Result<()>;

    /// Flush any buffered bytes to the underlying destination, and take
    /// the opportunity to detect destination rotation if applicable.
    fn flush(&mut self) -> Result<()>;

    /// Release the sink's resources. Must be idempotent.
    fn close(&mut self);
}
