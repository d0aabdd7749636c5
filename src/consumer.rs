//! The consumer thread body: drains the queue, dispatches records to the
//! sink, and backs off adaptively when the queue is empty.

use std::sync::Arc;
use std::time::Duration;

use crate::constants::{BACKOFF_MAX_SLEEP_MICROS, BACKOFF_SPIN_LIMIT, BACKOFF_YIELD_LIMIT};
use crate::queue::BoundedQueue;
use crate::record::{LogRecord, RecordKind, Timestamp};
use crate::sink::Sink;

fn now_ms() -> i64 {
    Timestamp::now().as_millis()
}

/// Three-phase adaptive backoff: pure spin while `attempts` is small,
/// yield to the scheduler for a while longer, then sleep for a capped
/// exponential duration. Returns whether this call slept (as opposed to
/// spinning or yielding).
pub fn backoff(attempts: u32) -> bool {
    if attempts < BACKOFF_SPIN_LIMIT {
        std::hint::spin_loop();
        false
    } else if attempts < BACKOFF_YIELD_LIMIT {
        std::thread::yield_now();
        false
    } else {
        let shift = attempts - BACKOFF_YIELD_LIMIT;
        let micros = 1u64
            .checked_shl(shift)
            .unwrap_or(u64::MAX)
            .min(BACKOFF_MAX_SLEEP_MICROS);
        std::thread::sleep(Duration::from_micros(micros));
        true
    }
}

/// Runs the consumer loop to completion (i.e. until a `STOP` record is
/// dispatched). Intended to be the body of the logger's dedicated consumer
/// thread.
pub(crate) fn run_consumer_loop(
    queue: Arc<BoundedQueue<LogRecord>>,
    mut sink: Box<dyn Sink>,
    flush_interval_ms: u64,
) {
    let mut last_flush = now_ms();
    let mut attempts: u32 = 0;
    let flush_interval_ms = flush_interval_ms as i64;

    loop {
        if let Some(record) = queue.try_pop() {
            attempts = 0;
            match record.kind {
                RecordKind::Stop => {
                    let _ = sink.flush();
                    sink.close();
                    return;
                }
                RecordKind::Flush => {
                    last_flush = now_ms();
                    let _ = sink.flush();
                }
                RecordKind::Data => {
                    if record.timestamp.as_millis() >= last_flush + flush_interval_ms {
                        last_flush = now_ms();
                        let _ = sink.write(record);
                        let _ = sink.flush();
                    } else {
                        let _ = sink.write(record);
                    }
                }
            }
        } else {
            attempts += 1;
            let slept = backoff(attempts);
            if slept && now_ms() >= last_flush + flush_interval_ms {
                last_flush = now_ms();
                let _ = sink.flush();
            }
        }
    }
}
