//! N-way frame slots between the analysis thread and a presenter
//!
//! A fixed set of slots circulates through two bounded queues of slot
//! indices: `free` and `ready`. The queues double as counting semaphores, so
//! at most N frames are ever in flight and nothing queues without bound.
//! The producer takes a free slot (reclaiming the oldest unread frame if none
//! is free, waiting a bounded time otherwise), fills it and publishes it; the
//! presenter takes the newest ready frame and the slot returns to `free` when
//! the read handle drops.

use crate::error::TimedOut;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use parking_lot::{Mutex, MutexGuard};
use std::ops::{Deref, DerefMut};
use std::time::Duration;

/// Fixed pool of reusable frame slots
pub struct FramePool<T> {
    slots: Vec<Mutex<T>>,
    free_tx: Sender<usize>,
    free_rx: Receiver<usize>,
    ready_tx: Sender<usize>,
    ready_rx: Receiver<usize>,
    timeout: Duration,
}

impl<T> FramePool<T> {
    /// Create a pool owning `slots`, all initially free
    ///
    /// # Panics
    /// If `slots` is empty.
    pub fn new(slots: Vec<T>, timeout: Duration) -> Self {
        assert!(!slots.is_empty(), "frame pool needs at least one slot");

        let n = slots.len();
        let (free_tx, free_rx) = bounded(n);
        let (ready_tx, ready_rx) = bounded(n);
        for index in 0..n {
            // Capacity is exactly n
            let _ = free_tx.try_send(index);
        }

        Self {
            slots: slots.into_iter().map(Mutex::new).collect(),
            free_tx,
            free_rx,
            ready_tx,
            ready_rx,
            timeout,
        }
    }

    /// Build a pool of `n` slots from a constructor
    pub fn with_slots(n: usize, timeout: Duration, make: impl FnMut() -> T) -> Self {
        Self::new(std::iter::repeat_with(make).take(n).collect(), timeout)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Frames published but not yet taken
    pub fn ready_len(&self) -> usize {
        self.ready_rx.len()
    }

    /// Take a slot to write the next frame into
    ///
    /// Prefers a free slot, then the oldest unread frame, then waits up to
    /// the pool timeout for the presenter to release one.
    pub fn acquire(&self) -> Result<WriteSlot<'_, T>, TimedOut> {
        let index = match self.free_rx.try_recv() {
            Ok(index) => index,
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => match self.ready_rx.try_recv() {
                Ok(index) => {
                    log::trace!("recycling unread frame slot {index}");
                    index
                }
                Err(_) => match self.free_rx.recv_timeout(self.timeout) {
                    Ok(index) => index,
                    Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => {
                        return Err(TimedOut { waited: self.timeout });
                    }
                },
            },
        };

        Ok(WriteSlot {
            pool: self,
            index,
            guard: self.slots[index].lock(),
            published: false,
        })
    }

    /// Take the newest published frame, releasing any older ones
    pub fn take_latest(&self) -> Option<ReadSlot<'_, T>> {
        let mut latest = self.ready_rx.try_recv().ok()?;
        while let Ok(newer) = self.ready_rx.try_recv() {
            self.release(latest);
            latest = newer;
        }

        Some(ReadSlot {
            pool: self,
            index: latest,
            guard: self.slots[latest].lock(),
        })
    }

    fn release(&self, index: usize) {
        // At most n indices circulate, so the free queue always has room
        let _ = self.free_tx.try_send(index);
    }

    fn publish(&self, index: usize) {
        let _ = self.ready_tx.try_send(index);
    }
}

/// Exclusive write access to one slot
///
/// Dropped without [`WriteSlot::publish`], the slot goes back to the free
/// queue and the presenter never sees it.
pub struct WriteSlot<'a, T> {
    pool: &'a FramePool<T>,
    index: usize,
    guard: MutexGuard<'a, T>,
    published: bool,
}

impl<T> WriteSlot<'_, T> {
    /// Hand the filled slot to the presenter
    pub fn publish(mut self) {
        self.published = true;
    }
}

impl<T> Deref for WriteSlot<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for WriteSlot<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for WriteSlot<'_, T> {
    fn drop(&mut self) {
        if self.published {
            self.pool.publish(self.index);
        } else {
            self.pool.release(self.index);
        }
    }
}

/// Read access to the newest frame; releases its slot on drop
pub struct ReadSlot<'a, T> {
    pool: &'a FramePool<T>,
    index: usize,
    guard: MutexGuard<'a, T>,
}

impl<T> Deref for ReadSlot<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> Drop for ReadSlot<'_, T> {
    fn drop(&mut self) {
        self.pool.release(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn pool(n: usize) -> FramePool<Vec<u32>> {
        FramePool::with_slots(n, Duration::from_millis(20), Vec::new)
    }

    #[test]
    fn test_publish_then_take() {
        let pool = pool(3);
        let mut slot = pool.acquire().unwrap();
        slot.push(7);
        slot.publish();

        assert_eq!(pool.ready_len(), 1);
        let frame = pool.take_latest().unwrap();
        assert_eq!(*frame, vec![7]);
        drop(frame);

        assert!(pool.take_latest().is_none());
    }

    #[test]
    fn test_take_latest_skips_older_frames() {
        let pool = pool(3);
        for value in 1..=3 {
            let mut slot = pool.acquire().unwrap();
            slot.clear();
            slot.push(value);
            slot.publish();
        }

        let frame = pool.take_latest().unwrap();
        assert_eq!(*frame, vec![3]);
        assert_eq!(pool.ready_len(), 0);
    }

    #[test]
    fn test_unpublished_slot_returns_to_free() {
        let pool = pool(1);
        {
            let mut slot = pool.acquire().unwrap();
            slot.push(1);
        }
        assert!(pool.take_latest().is_none());
        assert!(pool.acquire().is_ok());
    }

    #[test]
    fn test_producer_recycles_unread_frames() {
        let pool = pool(2);
        for value in 0..10 {
            let mut slot = pool.acquire().unwrap();
            slot.clear();
            slot.push(value);
            slot.publish();
        }
        assert_eq!(pool.ready_len(), 2);
        assert_eq!(*pool.take_latest().unwrap(), vec![9]);
    }

    #[test]
    fn test_acquire_times_out_when_all_slots_held() {
        let pool = pool(2);
        let _writing = pool.acquire().unwrap();
        let mut slot = pool.acquire().unwrap();
        slot.push(1);
        slot.publish();
        let _reading = pool.take_latest().unwrap();

        let err = pool.acquire().err().unwrap();
        assert_eq!(err.waited, Duration::from_millis(20));
    }

    #[test]
    fn test_slots_cross_threads() {
        let pool = Arc::new(FramePool::with_slots(3, Duration::from_millis(100), || 0u64));
        let producer = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for value in 1..=1000u64 {
                    if let Ok(mut slot) = pool.acquire() {
                        *slot = value;
                        slot.publish();
                    }
                }
            })
        };

        let mut last_seen = 0;
        while !producer.is_finished() {
            if let Some(frame) = pool.take_latest() {
                assert!(*frame >= last_seen, "frames went backwards");
                last_seen = *frame;
            }
        }
        producer.join().unwrap();

        if let Some(frame) = pool.take_latest() {
            last_seen = *frame;
        }
        assert_eq!(last_seen, 1000);
    }
}
