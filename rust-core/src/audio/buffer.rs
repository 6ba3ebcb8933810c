//! Lock-free sample feed between a capture callback and the analysis thread
//!
//! The capture side never blocks: samples that do not fit are dropped and
//! counted. The analysis side pops whole frames only.

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Single-producer single-consumer ring of `f32` samples
pub struct SampleFeed {
    producer: HeapProducer<f32>,
    consumer: HeapConsumer<f32>,
    capacity: usize,
}

impl SampleFeed {
    /// Create a feed holding up to `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let rb = HeapRb::<f32>::new(capacity);
        let (producer, consumer) = rb.split();

        Self {
            producer,
            consumer,
            capacity,
        }
    }

    /// Split into the capture end and the analysis end
    pub fn split(self) -> (FeedProducer, FeedConsumer) {
        let overflowed = Arc::new(AtomicU64::new(0));
        (
            FeedProducer {
                producer: self.producer,
                overflowed: Arc::clone(&overflowed),
            },
            FeedConsumer {
                consumer: self.consumer,
                overflowed,
                capacity: self.capacity,
            },
        )
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Capture end; safe to call from a real-time callback
pub struct FeedProducer {
    producer: HeapProducer<f32>,
    overflowed: Arc<AtomicU64>,
}

impl FeedProducer {
    /// Push as many samples as fit, returning how many were written
    ///
    /// The rest are dropped and added to the overflow count.
    pub fn write(&mut self, samples: &[f32]) -> usize {
        let written = self.producer.push_slice(samples);
        let dropped = samples.len() - written;
        if dropped > 0 {
            self.overflowed.fetch_add(dropped as u64, Ordering::Relaxed);
        }
        written
    }

    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }

    /// Samples dropped because the feed was full
    pub fn overflowed(&self) -> u64 {
        self.overflowed.load(Ordering::Relaxed)
    }
}

/// Analysis end
pub struct FeedConsumer {
    consumer: HeapConsumer<f32>,
    overflowed: Arc<AtomicU64>,
    capacity: usize,
}

impl FeedConsumer {
    /// Fill `frame` completely, or leave the feed untouched and return false
    pub fn read_frame(&mut self, frame: &mut [f32]) -> bool {
        if self.consumer.len() < frame.len() {
            return false;
        }
        self.consumer.pop_slice(frame);
        true
    }

    /// Drop queued samples so that at most `keep` remain
    ///
    /// Returns how many were discarded.
    pub fn discard_backlog(&mut self, keep: usize) -> usize {
        let excess = self.consumer.len().saturating_sub(keep);
        self.consumer.skip(excess)
    }

    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn overflowed(&self) -> u64 {
        self.overflowed.load(Ordering::Relaxed)
    }

    /// Shared overflow count, readable after the consumer moves to a thread
    pub(crate) fn overflow_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.overflowed)
    }
}
