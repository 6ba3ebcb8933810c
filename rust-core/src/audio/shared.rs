//! Bounded-wait sharing between the analysis thread and the display
//!
//! Every access waits at most a fixed timeout for the lock. On timeout the
//! operation is abandoned (a sample dropped, a frame skipped), so the
//! producer keeps its deadline and the display is eventually consistent.

use super::rolling::RollingBuffer;
use crate::error::TimedOut;
use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default bounded wait for shared state
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(100);

/// Mutex whose only acquisition path is a bounded wait
#[derive(Debug)]
pub struct TimedMutex<T> {
    inner: Mutex<T>,
    timeout: Duration,
}

impl<T> TimedMutex<T> {
    pub fn new(value: T, timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(value),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait up to the timeout for exclusive access
    pub fn lock(&self) -> Result<MutexGuard<'_, T>, TimedOut> {
        self.inner
            .try_lock_for(self.timeout)
            .ok_or(TimedOut { waited: self.timeout })
    }

    /// Run `f` under the lock
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, TimedOut> {
        let mut guard = self.lock()?;
        Ok(f(&mut guard))
    }

    /// Run `f` under the lock, or log and skip it on timeout
    pub fn with_or_skip<R>(&self, operation: &str, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        match self.with(f) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("{operation} skipped: {err}");
                None
            }
        }
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

/// What a display needs to draw the history: samples and axis bounds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySnapshot {
    /// Live samples, oldest to newest
    pub samples: Vec<f32>,
    pub min_value: f32,
    pub max_value: f32,
    pub capacity: usize,
}

/// Cloneable handle to a [`RollingBuffer`] behind a [`TimedMutex`]
///
/// Every method is all-or-nothing: on timeout nothing changes, the drop is
/// counted and `TimedOut` is returned for the caller to ignore or log.
#[derive(Debug, Clone)]
pub struct SharedRollingBuffer {
    buffer: Arc<TimedMutex<RollingBuffer>>,
    dropped: Arc<AtomicU64>,
}

impl SharedRollingBuffer {
    pub fn new(buffer: RollingBuffer, timeout: Duration) -> Self {
        Self {
            buffer: Arc::new(TimedMutex::new(buffer, timeout)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut RollingBuffer) -> R) -> Result<R, TimedOut> {
        self.buffer.with(f).map_err(|err| {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            err
        })
    }

    pub fn add(&self, sample: f32) -> Result<(), TimedOut> {
        self.with(|buffer| buffer.add(sample))
    }

    /// Add a block of samples under one lock acquisition
    pub fn add_slice(&self, samples: &[f32]) -> Result<(), TimedOut> {
        self.with(|buffer| buffer.extend_from_slice(samples))
    }

    pub fn replace(&self, samples: &[f32]) -> Result<(), TimedOut> {
        self.with(|buffer| buffer.replace(samples))
    }

    pub fn resize(&self, capacity: usize) -> Result<(), TimedOut> {
        self.with(|buffer| buffer.resize(capacity))
    }

    pub fn clear(&self) -> Result<(), TimedOut> {
        self.with(RollingBuffer::clear)
    }

    pub fn set_autoscaling(&self, autoscaling: bool) -> Result<(), TimedOut> {
        self.with(|buffer| buffer.set_autoscaling(autoscaling))
    }

    pub fn set_range(&self, min_value: f32, max_value: f32) -> Result<(), TimedOut> {
        self.with(|buffer| buffer.set_range(min_value, max_value))
    }

    /// Copy the live contents into `out`, reusing its allocation
    pub fn snapshot_into(&self, out: &mut HistorySnapshot) -> Result<(), TimedOut> {
        self.with(|buffer| {
            buffer.copy_into(&mut out.samples);
            out.min_value = buffer.min_value();
            out.max_value = buffer.max_value();
            out.capacity = buffer.capacity();
        })
    }

    pub fn snapshot(&self) -> Result<HistorySnapshot, TimedOut> {
        let mut snapshot = HistorySnapshot::default();
        self.snapshot_into(&mut snapshot)?;
        Ok(snapshot)
    }

    /// Operations abandoned on timeout since creation
    pub fn dropped_operations(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Direct access to the lock, for batching several operations
    pub fn lock(&self) -> Result<MutexGuard<'_, RollingBuffer>, TimedOut> {
        self.buffer.lock().map_err(|err| {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            err
        })
    }
}
