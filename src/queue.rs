//! Bounded lock-free multi-producer/multi-consumer queue.
//!
//! Implements the Vyukov bounded MPMC algorithm: a fixed-capacity ring of
//! cells, each carrying a sequence counter that is the sole synchronisation
//! point between producers and consumers. Wait-free under no contention,
//! lock-free under contention, FIFO per slot, no ABA (sequence counters
//! strictly increase by `capacity` per wrap).
//!
//! The queue never allocates after construction.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};

/// Cache-line-padded atomic cursor. Keeping `head` and `tail` on separate
/// cache lines avoids false sharing between the producer-dominated and
/// consumer-dominated sides of the queue.
#[repr(align(128))]
struct PaddedCursor {
    value: AtomicUsize,
}

impl PaddedCursor {
    fn new(v: usize) -> Self {
        Self {
            value: AtomicUsize::new(v),
        }
    }
}

struct Cell<T> {
    sequence: AtomicUsize,
    slot: UnsafeCell<MaybeUninit<T>>,
}

/// A fixed-capacity, power-of-two ring buffer supporting non-blocking
/// `try_push`/`try_pop` from any number of producer and consumer threads.
pub struct BoundedQueue<T> {
    buffer: Box<[Cell<T>]>,
    mask: usize,
    head: PaddedCursor,
    tail: PaddedCursor,
}

unsafe impl<T: Send> Send for BoundedQueue<T> {}
unsafe impl<T: Send> Sync for BoundedQueue<T> {}

impl<T> BoundedQueue<T> {
    /// Construct a queue of the given capacity, which must be a power of
    /// two and at least 2.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity < 2 || !capacity.is_power_of_two() {
            return Err(Error::config(format!(
                "queue capacity must be a power of two >= 2, got {capacity}"
            )));
        }

        let mut cells = Vec::with_capacity(capacity);
        for i in 0..capacity {
            cells.push(Cell {
                sequence: AtomicUsize::new(i),
                slot: UnsafeCell::new(MaybeUninit::uninit()),
            });
        }

        Ok(Self {
            buffer: cells.into_boxed_slice(),
            mask: capacity - 1,
            head: PaddedCursor::new(0),
            tail: PaddedCursor::new(0),
        })
    }

    /// Queue capacity (always a power of two).
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Attempt to enqueue `value`. Returns `Err(value)` if the queue is
    /// full.
    pub fn try_push(&self, value: T) -> std::result::Result<(), T> {
        let mut pos = self.head.value.load(Ordering::Relaxed);
        loop {
            let cell = &self.buffer[pos & self.mask];
            let seq = cell.sequence.load(Ordering::Acquire);
            let diff = seq as isize - pos as isize;

            if diff == 0 {
                if self
                    .head
                    .value
                    .compare_exchange_weak(
                        pos,
                        pos + 1,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    )
                    .is_ok()
                {
                    unsafe {
                        (*cell.slot.get()).write(value);
                    }
                    cell.sequence.store(pos + 1, Ordering::Release);
                    return Ok(());
                }
            } else if diff < 0 {
                return Err(value);
            } else {
                pos = self.head.value.load(Ordering::Relaxed);
            }
        }
    }

    /// Attempt to dequeue a value. Returns `None` if the queue is empty.
    pub fn try_pop(&self) -> Option<T> {
        let mut pos = self.tail.value.load(Ordering::Relaxed);
        loop {
            let cell = &self.buffer[pos & self.mask];
            let seq = cell.sequence.load(Ordering::Acquire);
            let diff = seq as isize - (pos as isize + 1);

            if diff == 0 {
                if self
                    .tail
                    .value
                    .compare_exchange_weak(
                        pos,
                        pos + 1,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    )
                    .is_ok()
                {
                    let value = unsafe { (*cell.slot.get()).assume_init_read() };
                    cell.sequence
                        .store(pos + self.mask + 1, Ordering::Release);
                    return Some(value);
                }
            } else if diff < 0 {
                return None;
            } else {
                pos = self.tail.value.load(Ordering::Relaxed);
            }
        }
    }
}

impl<T> Drop for BoundedQueue<T> {
    fn drop(&mut self) {
        // Drain any values still owned by the queue so producers that
        // enqueued but were never drained by a consumer don't leak.
        while self.try_pop().is_some() {}
    }
}
