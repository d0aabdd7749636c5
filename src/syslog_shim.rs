//! Process-wide singleton logger shim, for drop-in replacement of `syslog(3)`
//! call sites (`openlog`/`syslog`/`setlogmask`/`closelog`-shaped entry
//! points). Feature-gated behind `syslog-shim`: this is not part of the
//! core engine, only a convenience surface for callers migrating off the
//! real `syslog(3)`.

use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::config::Config;
use crate::logger::Logger;
use crate::record::Level;
use crate::sink::FileSink;

const ENV_CONFIG_FILE: &str = "ALOG_CONFIG_FILE";
const DEFAULT_CONFIG_PATHS: &[&str] = &["../conf/asynclog.json", "asynclog.json"];
const HOOK_QUEUE_SIZE: usize = 1024 * 1024;

static GLOBAL_LOGGER: OnceLock<Logger> = OnceLock::new();
static MASK: Mutex<i32> = Mutex::new(i32::MAX);

fn candidate_config_paths() -> Vec<String> {
    let mut paths = Vec::new();
    if let Ok(path) = std::env::var(ENV_CONFIG_FILE) {
        paths.push(path);
    }
    paths.extend(DEFAULT_CONFIG_PATHS.iter().map(|s| s.to_string()));
    paths
}

fn init_once() -> Logger {
    let logger = Logger::new();
    logger.set_queue_size(HOOK_QUEUE_SIZE).ok();

    let mut loaded = None;
    for candidate in candidate_config_paths() {
        if let Ok(cfg) = Config::from_file(std::path::Path::new(&candidate)) {
            loaded = Some((candidate, cfg));
            break;
        }
    }

    match loaded {
        Some((path, cfg)) => {
            let _ = logger.set_level(cfg.level);
            let sink_path = cfg
                .path
                .unwrap_or_else(|| format!("{}.log", process_name()));
            logger
                .set_sink(Box::new(FileSink::new(
                    sink_path,
                    &cfg.pattern,
                    std::sync::Arc::new(crate::internal_log::InternalLog::from_env()),
                )))
                .ok();
            logger.start().ok();
            logger.internal_log(Level::Info, &format!("loaded config file: {path}"));
        }
        None => {
            logger
                .set_sink(Box::new(FileSink::new(
                    format!("{}.log", process_name()),
                    crate::formatter::DEFAULT_PATTERN,
                    std::sync::Arc::new(crate::internal_log::InternalLog::from_env()),
                )))
                .ok();
            logger.start().ok();
            logger.internal_log(Level::Warn, "no config file found, using defaults");
        }
    }

    logger
}

fn process_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "alog".to_string())
}

fn global() -> &'static Logger {
    GLOBAL_LOGGER.get_or_init(init_once)
}

/// Shim for `openlog(3)`. `ident`/`option`/`facility` are accepted and
/// ignored, matching the original hook's behaviour — the engine has no
/// concept of syslog facilities.
pub fn openlog(_ident: &str, _option: i32, _facility: i32) {
    let _ = global();
}

/// Shim for `setlogmask(3)`. Stores the mask for later retrieval but does
/// not currently gate delivery by it — priority-to-level translation in
/// [`syslog`] already filters by [`Logger::should_log`].
pub fn setlogmask(mask: i32) -> i32 {
    let mut current = MASK.lock();
    let previous = *current;
    *current = mask;
    previous
}

fn translate_priority(priority: i32) -> Level {
    match priority {
        libc::LOG_EMERG | libc::LOG_ALERT | libc::LOG_CRIT => Level::Fatal,
        libc::LOG_ERR => Level::Error,
        libc::LOG_WARNING => Level::Warn,
        libc::LOG_NOTICE => Level::Notice,
        libc::LOG_INFO => Level::Info,
        libc::LOG_DEBUG => Level::Debug,
        _ => Level::Fatal,
    }
}

/// Shim for `syslog(3)`, minus the varargs format string — callers pass an
/// already-formatted message, since Rust has no `va_list` equivalent worth
/// reproducing here.
pub fn syslog(priority: i32, message: &str) {
    let logger = global();
    let level = translate_priority(priority);
    if logger.should_log(level) {
        logger.log(level, format_args!("{message}"));
    }
}

/// Shim for `closelog(3)`.
pub fn closelog() {
    if let Some(logger) = GLOBAL_LOGGER.get() {
        logger.stop();
    }
}
