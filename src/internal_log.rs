//! The logger's internal diagnostic channel.
//!
//! Distinct from the crate's own `tracing` instrumentation: this is a
//! line-buffered stream for reporting sink failures, driven by
//! `ALOG_INTERNAL_LOG_STDERR` / `ALOG_INTERNAL_LOG_FILE`. Writes are small
//! and infrequent; a mutex is adequate.

use std::fs::OpenOptions;
use std::io::Write;

use parking_lot::Mutex;

use crate::record::Level;

const ENV_STDERR: &str = "ALOG_INTERNAL_LOG_STDERR";
const ENV_FILE: &str = "ALOG_INTERNAL_LOG_FILE";

enum Destination {
    Silent,
    Stderr,
    File(std::fs::File),
}

/// Internal diagnostic stream owned by the logger. Safe to share between
/// the consumer thread and any sink that needs to report a failure.
pub struct InternalLog {
    dest: Mutex<Destination>,
}

impl InternalLog {
    /// Open according to `ALOG_INTERNAL_LOG_STDERR` (takes priority) and
    /// `ALOG_INTERNAL_LOG_FILE`; the channel is silent if neither is set.
    pub fn from_env() -> Self {
        let dest = if std::env::var_os(ENV_STDERR).is_some() {
            Destination::Stderr
        } else if let Some(path) = std::env::var_os(ENV_FILE) {
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => Destination::File(file),
                Err(_) => Destination::Silent,
            }
        } else {
            Destination::Silent
        };

        Self {
            dest: Mutex::new(dest),
        }
    }

    /// A channel that never writes anywhere; used in tests and as the
    /// default before a logger has a chance to read its environment.
    pub fn silent() -> Self {
        Self {
            dest: Mutex::new(Destination::Silent),
        }
    }

    /// Report one diagnostic line. Errors writing the diagnostic channel
    /// itself are deliberately swallowed — there is nowhere further to
    /// report them.
    pub fn log(&self, level: Level, message: &str) {
        let mut dest = self.dest.lock();
        match &mut *dest {
            Destination::Silent => {}
            Destination::Stderr => {
                let _ = writeln!(
                    std::io::stderr(),
                    "[{}] {}",
                    level.as_fixed_width_str().trim_end(),
                    message
                );
            }
            Destination::File(file) => {
                let _ = writeln!(
                    file,
                    "[{}] {}",
                    level.as_fixed_width_str().trim_end(),
                    message
                );
                let _ = file.flush();
            }
        }
    }
}

impl Default for InternalLog {
    fn default() -> Self {
        Self::silent()
    }
}
