//! Error types for the logging engine.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the logging engine.
///
/// Producer-path conditions (`FormatError`, `Truncation`, queue-full drops)
/// are never surfaced as a returned `Error` — they are silently counted in
/// [`crate::logger::Stats`] per the engine's propagation policy. This type
/// exists for the consumer-path and setup-path conditions that do return.
#[derive(Error, Debug)]
pub enum Error {
    /// Unformatted OS-level I/O failure (file open, stat, write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sink failed to write, flush, open, or stat its destination.
    #[error("sink I/O error: {message}")]
    SinkIo {
        /// Human-readable description of the failure.
        message: String,
    },

    /// Configuration was invalid or malformed.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// A formatting call failed unexpectedly (non-positive return length).
    #[error("format call failed")]
    FormatError,

    /// A formatted record exceeded the format buffer and was truncated.
    #[error("message truncated to fit format buffer")]
    Truncation,

    /// A condition that should not arise in a correctly functioning system.
    #[error("unexpected error: {message}")]
    Unexpected {
        /// Description of the unexpected condition.
        message: String,
    },
}

impl Error {
    /// Construct a [`Error::SinkIo`] from any displayable message.
    pub fn sink_io(message: impl Into<String>) -> Self {
        Self::SinkIo {
            message: message.into(),
        }
    }

    /// Construct a [`Error::Config`] from any displayable message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Construct a [`Error::Unexpected`] from any displayable message.
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Whether this error is expected to recur under sustained failure
    /// (e.g. a destination filesystem that stays unavailable) without being
    /// escalated to process termination.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SinkIo { .. } | Self::Io(_))
    }

    /// Whether this error originates from the configuration surface rather
    /// than from runtime I/O.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}
