//! Criterion benchmark of the bounded MPMC queue in isolation, independent
//! of any sink or formatting cost.
//!
//! Run: cargo bench --bench bench_queue

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;
use std::thread;

use alog::queue::BoundedQueue;

const CAPACITY: usize = 1024 * 1024;
const TOTAL_EVENTS: u64 = 2_000_000;

fn single_thread_push_pop(events: u64) {
    let queue: BoundedQueue<u64> = BoundedQueue::new(CAPACITY).unwrap();
    for i in 0..events {
        while queue.try_push(i).is_err() {
            std::hint::spin_loop();
        }
        let v = loop {
            if let Some(v) = queue.try_pop() {
                break v;
            }
            std::hint::spin_loop();
        };
        black_box(v);
    }
}

fn spsc_throughput(producers: usize, events: u64) -> u64 {
    let queue = Arc::new(BoundedQueue::<u64>::new(CAPACITY).unwrap());
    let per_producer = events / producers as u64;

    let consumer_queue = Arc::clone(&queue);
    let consumer = thread::spawn(move || {
        let mut received = 0u64;
        while received < per_producer * producers as u64 {
            if let Some(v) = consumer_queue.try_pop() {
                black_box(v);
                received += 1;
            } else {
                std::hint::spin_loop();
            }
        }
        received
    });

    let handles: Vec<_> = (0..producers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..per_producer {
                    while queue.try_push(i).is_err() {
                        std::hint::spin_loop();
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    consumer.join().unwrap()
}

fn benchmark_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("Single-thread push/pop");
    group.throughput(Throughput::Elements(TOTAL_EVENTS));
    group.sample_size(20);

    group.bench_function("try_push/try_pop", |b| {
        b.iter(|| single_thread_push_pop(TOTAL_EVENTS))
    });

    group.finish();
}

fn benchmark_mpmc_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("MPMC throughput by producer count");
    group.throughput(Throughput::Elements(TOTAL_EVENTS));
    group.sample_size(10);

    for producers in [1usize, 2, 4, 8] {
        group.bench_function(BenchmarkId::new("producers", producers), |b| {
            b.iter(|| spsc_throughput(producers, TOTAL_EVENTS))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_single_thread, benchmark_mpmc_scaling);
criterion_main!(benches);
