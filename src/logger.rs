//! The logger facade: lifecycle, configuration, counters, and the producer
//! fast path.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::constants::{DEFAULT_FLUSH_INTERVAL_MS, DEFAULT_FORMAT_BUFFER_SIZE, DEFAULT_QUEUE_SIZE};
use crate::consumer::run_consumer_loop;
use crate::error::{Error, Result};
use crate::internal_log::InternalLog;
use crate::queue::BoundedQueue;
use crate::record::{Level, LogRecord, RecordKind};
use crate::sink::Sink;

thread_local! {
    static CACHED_TID: Cell<u64> = Cell::new(0);
    static FORMAT_BUF: RefCell<String> = RefCell::new(String::new());
}

/// OS-level thread id, captured once per thread and cached thereafter —
/// the syscall dominates the producer fast path otherwise.
fn current_tid() -> u64 {
    CACHED_TID.with(|cell| {
        let cached = cell.get();
        if cached != 0 {
            return cached;
        }
        let tid = unsafe { libc::syscall(libc::SYS_gettid) } as u64;
        cell.set(tid);
        tid
    })
}

/// Atomic counters tracked by the producer fast path. `total = drop + err +
/// delivered + in_flight` at any quiescent moment.
#[derive(Default)]
struct Stats {
    total: AtomicU64,
    drop: AtomicU64,
    err: AtomicU64,
    trunc: AtomicU64,
}

impl Stats {
    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            drop: self.drop.load(Ordering::Relaxed),
            err: self.err.load(Ordering::Relaxed),
            trunc: self.trunc.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of the logger's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total: u64,
    pub drop: u64,
    pub err: u64,
    pub trunc: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} drop={} err={} trunc={}",
            self.total, self.drop, self.err, self.trunc
        )
    }
}

/// Lifecycle state: `Constructed -> Configured -> Running -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Constructed,
    Configured,
    Running,
    Stopped,
}

/// The logging engine's public facade.
///
/// `set_sink`/`set_queue_size`/`set_level` are only valid before `start`;
/// `start` requires a sink and spawns the dedicated consumer thread; `stop`
/// drains the queue and joins the consumer; logging calls are only
/// meaningful once running, though calling them in any other state is safe
/// (just silently inert) rather than undefined behaviour.
pub struct Logger {
    sink: Mutex<Option<Box<dyn Sink>>>,
    queue: OnceCell<Arc<BoundedQueue<LogRecord>>>,
    queue_size: AtomicUsize,
    level: AtomicU8,
    flush_interval_ms: AtomicU64,
    format_buffer_size: AtomicUsize,
    stats: Stats,
    internal: Arc<InternalLog>,
    consumer: Mutex<Option<JoinHandle<()>>>,
    configured: AtomicBool,
    started: AtomicBool,
    stopped: AtomicBool,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    pub fn new() -> Self {
        Self {
            sink: Mutex::new(None),
            queue: OnceCell::new(),
            queue_size: AtomicUsize::new(DEFAULT_QUEUE_SIZE),
            level: AtomicU8::new(Level::Info as u8),
            flush_interval_ms: AtomicU64::new(DEFAULT_FLUSH_INTERVAL_MS),
            format_buffer_size: AtomicUsize::new(DEFAULT_FORMAT_BUFFER_SIZE),
            stats: Stats::default(),
            internal: Arc::new(InternalLog::from_env()),
            consumer: Mutex::new(None),
            configured: AtomicBool::new(false),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        if self.stopped.load(Ordering::Acquire) {
            State::Stopped
        } else if self.started.load(Ordering::Acquire) {
            State::Running
        } else if self.configured.load(Ordering::Acquire) {
            State::Configured
        } else {
            State::Constructed
        }
    }

    fn ensure_not_started(&self) -> Result<()> {
        if self.started.load(Ordering::Acquire) {
            return Err(Error::config(
                "logger configuration is only valid before start()",
            ));
        }
        Ok(())
    }

    /// Install the sink. Must be called before `start`.
    pub fn set_sink(&self, sink: Box<dyn Sink>) -> Result<()> {
        self.ensure_not_started()?;
        *self.sink.lock() = Some(sink);
        self.configured.store(true, Ordering::Release);
        Ok(())
    }

    /// Override the bounded queue's capacity. Must be a power of two >= 2.
    /// Forbidden after `start()` — the original source's behaviour here is
    /// ambiguous, so this is treated as forbidden rather than guessed at.
    pub fn set_queue_size(&self, capacity: usize) -> Result<()> {
        self.ensure_not_started()?;
        if capacity < 2 || !capacity.is_power_of_two() {
            return Err(Error::config(format!(
                "queue capacity must be a power of two >= 2, got {capacity}"
            )));
        }
        self.queue_size.store(capacity, Ordering::Relaxed);
        self.configured.store(true, Ordering::Release);
        Ok(())
    }

    /// Set the minimum level that will be enqueued by the producer fast
    /// path. Must be called before `start`.
    pub fn set_level(&self, level: Level) -> Result<()> {
        self.ensure_not_started()?;
        self.level.store(level as u8, Ordering::Relaxed);
        self.configured.store(true, Ordering::Release);
        Ok(())
    }

    /// Override the flush cadence. Must be called before `start`.
    pub fn set_flush_interval_ms(&self, millis: u64) -> Result<()> {
        self.ensure_not_started()?;
        self.flush_interval_ms.store(millis, Ordering::Relaxed);
        Ok(())
    }

    /// Override the producer-path format buffer size. Must be called
    /// before `start`.
    pub fn set_format_buffer_size(&self, size: usize) -> Result<()> {
        self.ensure_not_started()?;
        self.format_buffer_size.store(size, Ordering::Relaxed);
        Ok(())
    }

    /// Relaxed atomic check of whether `level` would currently be
    /// delivered.
    pub fn should_log(&self, level: Level) -> bool {
        (level as u8) >= self.level.load(Ordering::Relaxed)
    }

    /// Snapshot of the producer-path counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Report a line on the logger's own internal diagnostic channel,
    /// distinct from anything enqueued for the sink. Used by callers that
    /// build on top of [`Logger`] (e.g. the syslog shim) to report setup
    /// conditions before the engine itself is running.
    pub(crate) fn internal_log(&self, level: Level, message: &str) {
        self.internal.log(level, message);
    }

    /// Spawn the consumer thread. Requires a sink to have been set and the
    /// logger to not already be started.
    pub fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(Error::config("logger already started"));
        }

        let sink = self
            .sink
            .lock()
            .take()
            .ok_or_else(|| Error::config("start() requires a sink to be set first"))?;

        let capacity = self.queue_size.load(Ordering::Relaxed);
        let queue = Arc::new(BoundedQueue::new(capacity)?);
        self.queue
            .set(Arc::clone(&queue))
            .map_err(|_| Error::unexpected("queue already initialised"))?;

        let flush_interval_ms = self.flush_interval_ms.load(Ordering::Relaxed);

        let handle = std::thread::Builder::new()
            .name("alog-consumer".into())
            .spawn(move || run_consumer_loop(queue, sink, flush_interval_ms))
            .map_err(Error::from)?;

        *self.consumer.lock() = Some(handle);
        Ok(())
    }

    /// Enqueue a STOP record (retrying until accepted), join the consumer,
    /// and release the internal diagnostic stream. Idempotent. Not safe to
    /// call concurrently with producers.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(queue) = self.queue.get() {
            let mut record = LogRecord::control(RecordKind::Stop);
            loop {
                match queue.try_push(record) {
                    Ok(()) => break,
                    Err(rejected) => {
                        record = rejected;
                        std::thread::yield_now();
                    }
                }
            }
        }

        if let Some(handle) = self.consumer.lock().take() {
            let _ = handle.join();
        }
    }

    /// Enqueue a FLUSH record (retrying until accepted) and return
    /// immediately — an advisory checkpoint, not a barrier.
    pub fn flush(&self) {
        let Some(queue) = self.queue.get() else {
            return;
        };
        let mut record = LogRecord::control(RecordKind::Flush);
        loop {
            match queue.try_push(record) {
                Ok(()) => break,
                Err(rejected) => {
                    record = rejected;
                    std::thread::yield_now();
                }
            }
        }
    }

    /// Producer fast path entry point: formats `args` and enqueues a DATA
    /// record if `level` passes the level gate. Never blocks.
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.should_log(level) {
            return;
        }
        self.emit(level, args);
    }

    /// Producer fast path entry point for pre-formatted binary payloads,
    /// skipping the formatting step entirely.
    pub fn log_binary(&self, level: Level, payload: &[u8]) {
        if !self.should_log(level) {
            return;
        }
        self.enqueue_payload(level, payload);
    }

    fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let format_buffer_size = self.format_buffer_size.load(Ordering::Relaxed);

        FORMAT_BUF.with(|cell| {
            let mut buf = cell.borrow_mut();
            buf.clear();

            if fmt::Write::write_fmt(&mut *buf, args).is_err() {
                self.stats.err.fetch_add(1, Ordering::Relaxed);
                buf.clear();
                buf.push_str("bad format call");
            } else if buf.len() >= format_buffer_size {
                self.stats.trunc.fetch_add(1, Ordering::Relaxed);
                buf.truncate(format_buffer_size.saturating_sub(1));
            }

            self.enqueue_payload(level, buf.as_bytes());
        });
    }

    fn enqueue_payload(&self, level: Level, payload: &[u8]) {
        let tid = current_tid();
        let record = LogRecord::data(level, tid, payload);

        let Some(queue) = self.queue.get() else {
            self.stats.drop.fetch_add(1, Ordering::Relaxed);
            self.stats.total.fetch_add(1, Ordering::Relaxed);
            return;
        };

        if queue.try_push(record).is_err() {
            self.stats.drop.fetch_add(1, Ordering::Relaxed);
        }
        self.stats.total.fetch_add(1, Ordering::Relaxed);
    }
}

/// Format and log a message at the given level through a [`Logger`],
/// mirroring `std::format_args!`-based logging macros so the level gate
/// runs before argument formatting.
#[macro_export]
macro_rules! alog {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        if $logger.should_log($level) {
            $logger.log($level, format_args!($($arg)+));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{FileSink, NullSink, Sink};
    use parking_lot::{Condvar, Mutex as PlMutex};
    use std::sync::Arc as StdArc;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    fn null_logger(queue_size: usize) -> Logger {
        let logger = Logger::new();
        logger.set_queue_size(queue_size).unwrap();
        logger.set_sink(Box::new(NullSink::new())).unwrap();
        logger
    }

    #[test]
    fn state_machine_transitions() {
        let logger = Logger::new();
        assert_eq!(logger.state(), State::Constructed);
        logger.set_level(Level::Debug).unwrap();
        assert_eq!(logger.state(), State::Configured);
        logger.set_sink(Box::new(NullSink::new())).unwrap();
        logger.start().unwrap();
        assert_eq!(logger.state(), State::Running);
        logger.stop();
        assert_eq!(logger.state(), State::Stopped);
    }

    #[test]
    fn set_queue_size_rejected_after_start() {
        let logger = null_logger(16);
        logger.start().unwrap();
        let err = logger.set_queue_size(32).unwrap_err();
        assert!(err.is_config_error());
        logger.stop();
    }

    #[test]
    fn start_without_sink_fails() {
        let logger = Logger::new();
        let err = logger.start().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn should_log_reflects_current_level() {
        let logger = Logger::new();
        logger.set_level(Level::Warn).unwrap();
        assert!(!logger.should_log(Level::Info));
        assert!(logger.should_log(Level::Error));
    }

    // S1 (fast path): 4 threads x 1,000,000 records into a queue of 1024,
    // null sink. total == 4,000,000, drop + delivered == 4,000,000, err == 0.
    // Stop completes within 1 second.
    #[test]
    fn scenario_s1_fast_path_under_contention() {
        const THREADS: usize = 4;
        const PER_THREAD: usize = 1_000_000;

        let logger = StdArc::new(null_logger(1024));
        logger.start().unwrap();

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let logger = StdArc::clone(&logger);
                std::thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        alog!(logger, Level::Info, "message {}", i);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let stats = logger.stats();
        assert_eq!(stats.total, (THREADS * PER_THREAD) as u64);
        assert_eq!(stats.err, 0);

        let start = Instant::now();
        logger.stop();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    // S2 (format truncation): a record whose formatted length is 3000 with
    // a format buffer of 2048 truncates to 2047 and counts trunc == 1.
    #[test]
    fn scenario_s2_format_truncation() {
        let logger = Logger::new();
        logger.set_format_buffer_size(2048).unwrap();
        logger.set_sink(Box::new(NullSink::new())).unwrap();
        logger.start().unwrap();

        let long_message = "x".repeat(3000);
        alog!(logger, Level::Info, "{}", long_message);
        logger.flush();
        std::thread::sleep(Duration::from_millis(50));

        let stats = logger.stats();
        assert_eq!(stats.trunc, 1);
        logger.stop();
    }

    // S4 (rotation), exercised through the logger rather than the sink
    // directly: records written before a rename land in the rotated file,
    // records written after the next flush land in a freshly opened file.
    #[test]
    fn scenario_s4_rotation_through_logger() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let rotated = dir.path().join("app.log.1");

        let logger = Logger::new();
        logger.set_flush_interval_ms(50).unwrap();
        logger
            .set_sink(Box::new(FileSink::new(
                &path,
                "%(msg)",
                StdArc::new(InternalLog::silent()),
            )))
            .unwrap();
        logger.start().unwrap();

        for i in 0..10 {
            alog!(logger, Level::Info, "line{}", i);
        }
        logger.flush();
        std::thread::sleep(Duration::from_millis(150));

        std::fs::rename(&path, &rotated).unwrap();

        alog!(logger, Level::Info, "post-rotation");
        logger.flush();
        std::thread::sleep(Duration::from_millis(150));
        logger.stop();

        let old_contents = std::fs::read_to_string(&rotated).unwrap();
        for i in 0..10 {
            assert!(old_contents.contains(&format!("line{i}")));
        }
        let new_contents = std::fs::read_to_string(&path).unwrap();
        assert!(new_contents.contains("post-rotation"));
    }

    // S5 (stop drains): 1000 records enqueued, then stop() — all 1000 must
    // appear in the sink before close is observed.
    #[test]
    fn scenario_s5_stop_drains_queue() {
        let recorded = StdArc::new(PlMutex::new(Vec::<u64>::new()));
        let closed = StdArc::new(AtomicBool::new(false));

        struct RecordingSink {
            recorded: StdArc<PlMutex<Vec<u64>>>,
            closed: StdArc<AtomicBool>,
        }
        impl Sink for RecordingSink {
            fn write(&mut self, record: LogRecord) -> Result<()> {
                self.recorded.lock().push(record.thread_id);
                Ok(())
            }
            fn flush(&mut self) -> Result<()> {
                Ok(())
            }
            fn close(&mut self) {
                self.closed.store(true, Ordering::SeqCst);
            }
        }

        let logger = Logger::new();
        logger.set_queue_size(2048).unwrap();
        logger
            .set_sink(Box::new(RecordingSink {
                recorded: StdArc::clone(&recorded),
                closed: StdArc::clone(&closed),
            }))
            .unwrap();
        logger.start().unwrap();

        for i in 0..1000 {
            alog!(logger, Level::Info, "rec{}", i);
        }
        logger.stop();

        assert_eq!(recorded.lock().len(), 1000);
        assert!(closed.load(Ordering::SeqCst));
    }

    // S6 (overflow drop): a queue of capacity 4 with a consumer blocked on
    // its first write must drop almost all of 100 emitted records, then
    // deliver a small prefix once unblocked, without crashing.
    #[test]
    fn scenario_s6_overflow_drop_with_blocked_consumer() {
        struct BlockingSink {
            gate: StdArc<(PlMutex<bool>, Condvar)>,
            first: bool,
            delivered: StdArc<AtomicU64>,
        }
        impl Sink for BlockingSink {
            fn write(&mut self, record: LogRecord) -> Result<()> {
                if self.first {
                    self.first = false;
                    let (lock, cvar) = &*self.gate;
                    let mut unlocked = lock.lock();
                    while !*unlocked {
                        cvar.wait(&mut unlocked);
                    }
                }
                drop(record);
                self.delivered.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            fn flush(&mut self) -> Result<()> {
                Ok(())
            }
            fn close(&mut self) {}
        }

        let gate = StdArc::new((PlMutex::new(false), Condvar::new()));
        let delivered = StdArc::new(AtomicU64::new(0));

        let logger = StdArc::new(Logger::new());
        logger.set_queue_size(4).unwrap();
        logger
            .set_sink(Box::new(BlockingSink {
                gate: StdArc::clone(&gate),
                first: true,
                delivered: StdArc::clone(&delivered),
            }))
            .unwrap();
        logger.start().unwrap();

        for i in 0..100 {
            alog!(logger, Level::Info, "rec{}", i);
        }
        // Give the consumer a moment to claim the first record and block.
        std::thread::sleep(Duration::from_millis(50));

        let stats_while_blocked = logger.stats();
        assert!(stats_while_blocked.drop >= 96);

        {
            let (lock, cvar) = &*gate;
            *lock.lock() = true;
            cvar.notify_all();
        }
        logger.stop();

        assert!(delivered.load(Ordering::SeqCst) <= 5);
    }
}
