//! Criterion benchmark of the full producer fast path through [`Logger`]
//! with a null sink, isolating queueing/formatting cost from destination
//! I/O.
//!
//! Run: cargo bench --bench bench_logger

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;

use alog::{alog, Level, Logger, NullSink};

const TOTAL_EVENTS: u64 = 1_000_000;

fn run_producers(producers: usize, events: u64) {
    let logger = Arc::new(Logger::new());
    logger.set_queue_size(1 << 16).unwrap();
    logger.set_sink(Box::new(NullSink::new())).unwrap();
    logger.start().unwrap();

    let per_producer = events / producers as u64;
    let handles: Vec<_> = (0..producers)
        .map(|_| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..per_producer {
                    alog!(logger, Level::Info, "bench message {}", i);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    logger.stop();
}

fn benchmark_producer_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Logger fast path by producer count");
    group.throughput(Throughput::Elements(TOTAL_EVENTS));
    group.sample_size(10);

    for producers in [1usize, 2, 4, 8] {
        group.bench_function(BenchmarkId::new("producers", producers), |b| {
            b.iter(|| run_producers(producers, TOTAL_EVENTS))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_producer_scaling);
criterion_main!(benches);
