//! JSON configuration surface.
//!
//! Expressed with `serde`/`serde_json` rather than a hand-rolled parser:
//! the four keys this format carries (`path`, `pattern`, `level`,
//! `queue_size`) deserialize directly onto a struct, with
//! `deny_unknown_fields` enforcing "unknown keys are errors".

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::formatter::DEFAULT_PATTERN;
use crate::record::Level;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    queue_size: Option<u64>,
}

/// A validated configuration ready to apply to a [`crate::logger::Logger`].
#[derive(Debug, Clone)]
pub struct Config {
    pub path: Option<String>,
    pub pattern: String,
    pub level: Level,
    /// `None` means "unspecified" — a `queue_size` of `0` in the source
    /// JSON is treated the same way, per the external interface contract.
    pub queue_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: None,
            pattern: DEFAULT_PATTERN.to_string(),
            level: Level::Info,
            queue_size: None,
        }
    }
}

impl Config {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Config> {
        let raw: RawConfig = serde_json::from_str(text)
            .map_err(|e| Error::config(format!("invalid configuration JSON: {e}")))?;
        Self::from_raw(raw)
    }

    /// Parse and validate a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn from_raw(raw: RawConfig) -> Result<Config> {
        let level = match raw.level {
            Some(name) => Level::parse(&name)
                .ok_or_else(|| Error::config(format!("unrecognised level: {name}")))?,
            None => Level::Info,
        };

        let pattern = raw.pattern.unwrap_or_else(|| DEFAULT_PATTERN.to_string());
        // Validate the pattern compiles; the formatter never fails to
        // compile a pattern (unrecognised specifiers render literally), so
        // this only guards against nothing today but documents the
        // contract for future specifier validation.
        let _ = crate::formatter::PatternFormatter::new(&pattern);

        let queue_size = match raw.queue_size {
            Some(0) | None => None,
            Some(n) => Some(n as usize),
        };

        Ok(Config {
            path: raw.path,
            pattern,
            level,
            queue_size,
        })
    }
}
