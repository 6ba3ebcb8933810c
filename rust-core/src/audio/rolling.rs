//! Fixed-capacity rolling sample history with autoscaling bounds
//!
//! Holds the most recent `capacity` samples for a scrolling display. While
//! not full, live samples sit at `storage[..count]` in insertion order and
//! the write offset equals the count; once full, the oldest sample is at the
//! write offset.
//!
//! With autoscaling on, `min_value <= s <= max_value` holds for every live
//! sample `s` (within [`EXTREMUM_EPSILON`]).

/// Smallest allowed capacity
pub const MIN_CAPACITY: usize = 2;

/// Largest allowed capacity
pub const MAX_CAPACITY: usize = i32::MAX as usize;

/// Tolerance when deciding whether an evicted sample was an extremum
pub const EXTREMUM_EPSILON: f32 = 1e-5;

/// Rolling sample buffer
#[derive(Debug, Clone)]
pub struct RollingBuffer {
    storage: Vec<f32>,

    /// Next write position
    write_offset: usize,

    /// Live samples, saturates at capacity
    count_written: usize,

    /// Samples added since the last clear; keys the bootstrap rescan
    samples_added: usize,

    min_value: f32,
    max_value: f32,
    autoscaling: bool,
}

fn clamp_capacity(capacity: usize) -> usize {
    capacity.clamp(MIN_CAPACITY, MAX_CAPACITY)
}

impl RollingBuffer {
    /// Create an empty buffer; capacity is clamped to [2, i32::MAX]
    pub fn new(capacity: usize, autoscaling: bool) -> Self {
        Self {
            storage: vec![0.0; clamp_capacity(capacity)],
            write_offset: 0,
            count_written: 0,
            samples_added: 0,
            min_value: 0.0,
            max_value: 1.0,
            autoscaling,
        }
    }

    /// Append a sample, evicting the oldest one when full
    pub fn add(&mut self, sample: f32) {
        let capacity = self.capacity();
        let was_full = self.is_full();
        let evicted = self.storage[self.write_offset];

        self.storage[self.write_offset] = sample;
        self.write_offset = (self.write_offset + 1) % capacity;
        self.count_written = (self.count_written + 1).min(capacity);
        self.samples_added = self.samples_added.saturating_add(1);

        if !self.autoscaling {
            return;
        }

        match self.samples_added {
            1 => {
                self.min_value = sample - 1.0;
                self.max_value = sample + 1.0;
            }
            // Drop the ±1 padding from the first sample
            2 => self.rescan(),
            _ => {
                if sample > self.max_value {
                    self.max_value = sample;
                }
                if sample < self.min_value {
                    self.min_value = sample;
                }
                if was_full
                    && ((evicted - self.min_value).abs() < EXTREMUM_EPSILON
                        || (evicted - self.max_value).abs() < EXTREMUM_EPSILON)
                {
                    self.rescan();
                }
            }
        }
    }

    /// Append every sample in order
    pub fn extend_from_slice(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.add(sample);
        }
    }

    /// Replace the contents; capacity becomes `samples.len()`
    ///
    /// No-op for an empty slice. A single sample still gets the minimum
    /// capacity of two.
    pub fn replace(&mut self, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }

        let capacity = clamp_capacity(samples.len());
        self.storage.clear();
        self.storage.extend_from_slice(samples);
        self.storage.resize(capacity, 0.0);

        self.count_written = samples.len().min(capacity);
        self.write_offset = self.count_written % capacity;
        self.samples_added = self.count_written;
        self.rescan();
    }

    /// Change capacity, keeping the most recent samples in order
    ///
    /// Growing pads with zeroed slots after the newest sample. Shrinking
    /// drops the oldest slots first: the region from the write offset to the
    /// end, then the start of storage.
    pub fn resize(&mut self, new_capacity: usize) {
        let new_capacity = clamp_capacity(new_capacity);
        let capacity = self.capacity();

        if new_capacity > capacity {
            if self.is_full() {
                self.storage.rotate_left(self.write_offset);
                self.write_offset = capacity;
            }
            self.storage.resize(new_capacity, 0.0);
        } else if new_capacity < capacity {
            let excess = capacity - new_capacity;
            let tail = capacity - self.write_offset;

            if excess <= tail {
                self.storage
                    .drain(self.write_offset..self.write_offset + excess);
                if self.write_offset >= new_capacity {
                    self.write_offset = 0;
                }
            } else {
                self.storage.truncate(self.write_offset);
                self.storage.drain(..excess - tail);
                self.write_offset = 0;
            }
            self.count_written = self.count_written.min(new_capacity);
        }

        log::debug!("rolling buffer resized from {capacity} to {new_capacity}");
        self.rescan();
    }

    /// Zero the storage and reset bounds to [0, 1]
    pub fn clear(&mut self) {
        self.storage.fill(0.0);
        self.write_offset = 0;
        self.count_written = 0;
        self.samples_added = 0;
        self.min_value = 0.0;
        self.max_value = 1.0;
    }

    /// Recompute bounds over the live samples
    fn rescan(&mut self) {
        if !self.autoscaling || self.count_written == 0 {
            return;
        }
        let (min, max) = self
            .live()
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &s| {
                (lo.min(s), hi.max(s))
            });
        self.min_value = min;
        self.max_value = max;
    }

    /// Live samples in physical order
    fn live(&self) -> &[f32] {
        if self.is_full() {
            &self.storage
        } else {
            &self.storage[..self.count_written]
        }
    }

    /// Live samples, oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let (newer, older) = if self.is_full() {
            self.storage.split_at(self.write_offset)
        } else {
            (&self.storage[..self.count_written], &self.storage[..0])
        };
        older.iter().chain(newer.iter()).copied()
    }

    /// Copy live samples, oldest to newest, reusing `out`'s allocation
    pub fn copy_into(&self, out: &mut Vec<f32>) {
        out.clear();
        out.extend(self.iter());
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.iter().collect()
    }

    /// Most recently added sample
    pub fn latest(&self) -> Option<f32> {
        if self.count_written == 0 {
            return None;
        }
        let capacity = self.capacity();
        Some(self.storage[(self.write_offset + capacity - 1) % capacity])
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    pub fn len(&self) -> usize {
        self.count_written
    }

    pub fn is_empty(&self) -> bool {
        self.count_written == 0
    }

    pub fn is_full(&self) -> bool {
        self.count_written == self.capacity()
    }

    pub fn write_offset(&self) -> usize {
        self.write_offset
    }

    pub fn min_value(&self) -> f32 {
        self.min_value
    }

    pub fn max_value(&self) -> f32 {
        self.max_value
    }

    pub fn range(&self) -> (f32, f32) {
        (self.min_value, self.max_value)
    }

    pub fn is_autoscaling(&self) -> bool {
        self.autoscaling
    }

    /// Turning autoscaling on rescans immediately
    pub fn set_autoscaling(&mut self, autoscaling: bool) {
        self.autoscaling = autoscaling;
        self.rescan();
    }

    /// Set display bounds by hand; the next rescan overrides them if
    /// autoscaling is on
    pub fn set_range(&mut self, min_value: f32, max_value: f32) {
        self.min_value = min_value;
        self.max_value = max_value;
    }
}
