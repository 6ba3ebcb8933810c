//! Spectrum monitor - keeps the analysis loop in Rust
//!
//! A capture callback writes samples into a [`FeedProducer`]. The analysis
//! thread pops whole frames, transforms them and hands the results to the
//! display side through bounded-wait shared state:
//!
//! * the newest [`SpectrumFrame`] through an N-way [`FramePool`]
//! * the magnitude spectrum through a [`SharedRollingBuffer`] replaced per frame
//! * one scalar per frame (or the raw samples) appended to a history buffer
//!
//! Any bounded wait that expires skips that piece of work for the frame.

use super::buffer::{FeedConsumer, FeedProducer, SampleFeed};
use super::frames::{FramePool, ReadSlot};
use super::rolling::{RollingBuffer, MAX_CAPACITY, MIN_CAPACITY};
use super::shared::{SharedRollingBuffer, TimedMutex};
use crate::config::{HistorySource, MonitorConfig, MAX_FFT_SIZE, MIN_FFT_SIZE};
use crate::error::{ConfigError, MonitorError, TimedOut};
use crate::spectrum::{next_power_of_two, Analyzer, Descriptors, Window};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Frames of backlog the analysis thread tolerates before skipping ahead
pub const MAX_BACKLOG_FRAMES: usize = 4;

const IDLE_SLEEP: Duration = Duration::from_micros(100);

/// Everything the presenter needs to draw one analyzed frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumFrame {
    /// Monotonic frame counter, starting at 0
    pub sequence: u64,
    pub magnitude: Vec<f32>,
    pub nyquist: f32,
    pub descriptors: Descriptors,
    pub sample_rate: f32,
    pub fft_size: usize,
}

/// Counters for dropped and completed work
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub frames_analyzed: u64,
    /// Frames dropped because the analyzer lock timed out
    pub frames_skipped: u64,
    /// Analyzed frames that found no free slot for the presenter
    pub frames_unpublished: u64,
    pub history_dropped: u64,
    pub spectrum_dropped: u64,
    /// Samples the capture side dropped on a full feed
    pub feed_overflowed: u64,
}

/// State shared between the analysis thread and the monitor handle
struct Pipeline {
    analyzer: TimedMutex<Analyzer>,
    frames: FramePool<SpectrumFrame>,
    spectrum_view: SharedRollingBuffer,
    history: SharedRollingBuffer,
    history_source: HistorySource,
    sequence: AtomicU64,
    skipped: AtomicU64,
    unpublished: AtomicU64,
}

impl Pipeline {
    fn lock_analyzer(&self) -> Result<parking_lot::MutexGuard<'_, Analyzer>, TimedOut> {
        self.analyzer.lock().map_err(|err| {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            log::warn!("frame skipped: {err}");
            err
        })
    }

    /// Analyze one frame and fan the results out
    fn analyze(&self, analyzer: &mut Analyzer, frame: &[f32]) -> u64 {
        let nyquist = analyzer.process(frame).nyquist;
        let descriptors = analyzer.descriptors();
        let magnitude = analyzer.magnitude();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);

        match self.frames.acquire() {
            Ok(mut slot) => {
                slot.sequence = sequence;
                slot.magnitude.clear();
                slot.magnitude.extend_from_slice(magnitude);
                slot.nyquist = nyquist;
                slot.descriptors = descriptors;
                slot.sample_rate = analyzer.sample_rate();
                slot.fft_size = analyzer.fft_size();
                slot.publish();
            }
            Err(err) => {
                self.unpublished.fetch_add(1, Ordering::Relaxed);
                log::warn!("frame {sequence} not published: {err}");
            }
        }

        if let Err(err) = self.spectrum_view.replace(magnitude) {
            log::warn!("spectrum view update skipped: {err}");
        }

        let history = match self.history_source {
            HistorySource::Samples => self.history.add_slice(frame),
            HistorySource::PeakEnergy => self.history.add(descriptors.peak_energy),
            HistorySource::Rms => self.history.add(descriptors.rms),
            HistorySource::Centroid => self.history.add(descriptors.centroid),
            HistorySource::Loudness => self.history.add(descriptors.loudness),
        };
        if let Err(err) = history {
            log::warn!("history update skipped: {err}");
        }

        sequence
    }
}

/// Live spectrum monitor
///
/// Owns the analysis thread and exposes the consumer side. Consumer methods
/// take `&self`, so the monitor can sit behind an `Arc` shared with a render
/// timer.
pub struct SpectrumMonitor {
    pipeline: Arc<Pipeline>,
    feed: Option<FeedConsumer>,
    feed_capacity: usize,
    feed_overflowed: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<FeedConsumer>>,
}

impl SpectrumMonitor {
    /// Build a stopped monitor and the producer end of its sample feed
    pub fn new(config: MonitorConfig) -> Result<(Self, FeedProducer), MonitorError> {
        config.validate()?;

        let analyzer = Analyzer::new(config.fft_size, config.sample_rate, config.window);
        let num_bins = analyzer.num_bins();
        let frames = FramePool::with_slots(config.frame_slots, config.lock_timeout, || SpectrumFrame {
            magnitude: Vec::with_capacity(num_bins),
            ..SpectrumFrame::default()
        });

        let pipeline = Pipeline {
            analyzer: TimedMutex::new(analyzer, config.lock_timeout),
            frames,
            spectrum_view: SharedRollingBuffer::new(RollingBuffer::new(num_bins, true), config.lock_timeout),
            history: SharedRollingBuffer::new(
                RollingBuffer::new(config.history_capacity, config.autoscaling),
                config.lock_timeout,
            ),
            history_source: config.history_source,
            sequence: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            unpublished: AtomicU64::new(0),
        };

        let (producer, consumer) = SampleFeed::new(config.feed_capacity).split();
        let monitor = Self {
            pipeline: Arc::new(pipeline),
            feed_overflowed: consumer.overflow_counter(),
            feed: Some(consumer),
            feed_capacity: config.feed_capacity,
            running: Arc::new(AtomicBool::new(false)),
            thread: None,
        };

        Ok((monitor, producer))
    }

    /// Start the analysis thread
    pub fn start(&mut self) -> Result<(), MonitorError> {
        if self.thread.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }
        let mut feed = self.feed.take().ok_or(MonitorError::FeedLost)?;

        self.running.store(true, Ordering::SeqCst);
        let pipeline = Arc::clone(&self.pipeline);
        let running = Arc::clone(&self.running);

        let handle = thread::Builder::new()
            .name("spectrum-analysis".into())
            .spawn(move || {
                log::info!("analysis thread started");
                let mut frame = Vec::new();

                while running.load(Ordering::SeqCst) {
                    let Ok(mut analyzer) = pipeline.lock_analyzer() else {
                        continue;
                    };

                    let fft_size = analyzer.fft_size();
                    frame.resize(fft_size, 0.0);

                    let skipped = feed.discard_backlog(fft_size * MAX_BACKLOG_FRAMES);
                    if skipped > 0 {
                        log::debug!("analysis behind, skipped {skipped} samples");
                    }

                    if feed.read_frame(&mut frame) {
                        pipeline.analyze(&mut analyzer, &frame);
                    } else {
                        drop(analyzer);
                        thread::sleep(IDLE_SLEEP);
                    }
                }

                log::info!("analysis thread stopped");
                feed
            })
            .map_err(|err| {
                self.running.store(false, Ordering::SeqCst);
                MonitorError::Spawn(err)
            })?;

        self.thread = Some(handle);
        Ok(())
    }

    /// Stop the analysis thread and wait for it
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread.take() {
            match handle.join() {
                Ok(feed) => self.feed = Some(feed),
                Err(_) => log::error!("analysis thread panicked; sample feed lost"),
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Analyze one frame on the calling thread
    ///
    /// Returns the frame's sequence number, or `TimedOut` if the analyzer
    /// was busy and the frame was dropped.
    ///
    /// # Panics
    /// If `frame.len()` differs from the current FFT size.
    pub fn push_frame(&self, frame: &[f32]) -> Result<u64, TimedOut> {
        let mut analyzer = self.pipeline.lock_analyzer()?;
        Ok(self.pipeline.analyze(&mut analyzer, frame))
    }

    /// Rebuild the FFT for a new size and sample rate
    pub fn resize_fft(&self, fft_size: usize, sample_rate: f32) -> Result<(), MonitorError> {
        if !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size) {
            return Err(ConfigError::FftSize(fft_size).into());
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ConfigError::SampleRate(sample_rate).into());
        }
        let effective = next_power_of_two(fft_size);
        if effective > self.feed_capacity {
            return Err(ConfigError::FeedCapacity {
                feed: self.feed_capacity,
                fft_size: effective,
            }
            .into());
        }

        self.pipeline.analyzer.lock()?.resize(fft_size, sample_rate);
        Ok(())
    }

    pub fn set_window(&self, window: Window) -> Result<(), MonitorError> {
        window.validate()?;
        self.pipeline.analyzer.lock()?.set_window(window);
        log::debug!("analysis window set to {window}");
        Ok(())
    }

    pub fn resize_history(&self, capacity: usize) -> Result<(), MonitorError> {
        if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&capacity) {
            return Err(ConfigError::HistoryCapacity(capacity).into());
        }
        self.pipeline.history.resize(capacity)?;
        log::debug!("history capacity set to {capacity}");
        Ok(())
    }

    pub fn clear_history(&self) -> Result<(), TimedOut> {
        self.pipeline.history.clear()
    }

    /// Newest published frame; its slot is released when the handle drops
    pub fn latest_frame(&self) -> Option<ReadSlot<'_, SpectrumFrame>> {
        self.pipeline.frames.take_latest()
    }

    /// Handle to the history buffer
    pub fn history(&self) -> SharedRollingBuffer {
        self.pipeline.history.clone()
    }

    /// Handle to the buffer holding the latest magnitude spectrum
    pub fn spectrum_view(&self) -> SharedRollingBuffer {
        self.pipeline.spectrum_view.clone()
    }

    pub fn stats(&self) -> MonitorStats {
        let pipeline = &self.pipeline;
        MonitorStats {
            frames_analyzed: pipeline.sequence.load(Ordering::Relaxed),
            frames_skipped: pipeline.skipped.load(Ordering::Relaxed),
            frames_unpublished: pipeline.unpublished.load(Ordering::Relaxed),
            history_dropped: pipeline.history.dropped_operations(),
            spectrum_dropped: pipeline.spectrum_view.dropped_operations(),
            feed_overflowed: self.feed_overflowed.load(Ordering::Relaxed),
        }
    }
}

impl Drop for SpectrumMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn config() -> MonitorConfig {
        MonitorConfig {
            fft_size: 256,
            sample_rate: 8000.0,
            history_capacity: 16,
            feed_capacity: 4096,
            lock_timeout: Duration::from_millis(20),
            ..MonitorConfig::default()
        }
    }

    fn tone(n: usize, sample_rate: f32, freq_hz: f32, amplitude: f32) -> Vec<f32> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * freq_hz * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let bad = MonitorConfig { frame_slots: 0, ..config() };
        assert!(matches!(
            SpectrumMonitor::new(bad),
            Err(MonitorError::Config(ConfigError::FrameSlots))
        ));
    }

    #[test]
    fn test_push_frame_publishes_everything() {
        let (monitor, _producer) = SpectrumMonitor::new(config()).unwrap();
        // 1000 Hz at 8 kHz is bin 32 of 256
        let frame = tone(256, 8000.0, 1000.0, 0.8);

        assert_eq!(monitor.push_frame(&frame), Ok(0));

        let latest = monitor.latest_frame().unwrap();
        assert_eq!(latest.sequence, 0);
        assert_eq!(latest.fft_size, 256);
        assert_eq!(latest.magnitude.len(), 128);
        let peak = (0..64).max_by(|&a, &b| latest.magnitude[a].total_cmp(&latest.magnitude[b]));
        assert_eq!(peak, Some(32));
        assert!((latest.descriptors.peak_energy - 0.8).abs() < 1e-3);
        drop(latest);

        let view = monitor.spectrum_view().snapshot().unwrap();
        assert_eq!(view.samples.len(), 128);
        assert_eq!(view.capacity, 128);

        let history = monitor.history().snapshot().unwrap();
        assert_eq!(history.samples.len(), 1);
        assert!((history.samples[0] - 0.8).abs() < 1e-3);

        let stats = monitor.stats();
        assert_eq!(stats.frames_analyzed, 1);
        assert_eq!(stats.frames_skipped, 0);
    }

    #[test]
    fn test_sample_history_appends_raw_samples() {
        let (monitor, _producer) = SpectrumMonitor::new(MonitorConfig {
            fft_size: 8,
            history_source: HistorySource::Samples,
            history_capacity: 12,
            ..config()
        })
        .unwrap();

        let first: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let second: Vec<f32> = (8..16).map(|i| i as f32).collect();
        monitor.push_frame(&first).unwrap();
        monitor.push_frame(&second).unwrap();

        let history = monitor.history().snapshot().unwrap();
        let expected: Vec<f32> = (4..16).map(|i| i as f32).collect();
        assert_eq!(history.samples, expected);
        assert_eq!((history.min_value, history.max_value), (4.0, 15.0));
    }

    #[test]
    fn test_busy_analyzer_skips_frame() {
        let (monitor, _producer) = SpectrumMonitor::new(config()).unwrap();
        let _busy = monitor.pipeline.analyzer.lock().unwrap();

        let frame = vec![0.0; 256];
        assert!(monitor.push_frame(&frame).is_err());
        assert_eq!(monitor.stats().frames_skipped, 1);
        assert_eq!(monitor.stats().frames_analyzed, 0);
    }

    #[test]
    fn test_control_operations() {
        let (monitor, _producer) = SpectrumMonitor::new(config()).unwrap();

        monitor.resize_fft(500, 16000.0).unwrap();
        monitor.push_frame(&vec![0.1; 512]).unwrap();
        let latest = monitor.latest_frame().unwrap();
        assert_eq!(latest.fft_size, 512);
        assert_eq!(latest.sample_rate, 16000.0);
        assert_eq!(latest.magnitude.len(), 256);
        drop(latest);

        assert!(matches!(
            monitor.resize_fft(4, 8000.0),
            Err(MonitorError::Config(ConfigError::FftSize(4)))
        ));
        assert!(matches!(
            monitor.resize_fft(8192, 8000.0),
            Err(MonitorError::Config(ConfigError::FeedCapacity { .. }))
        ));
        assert!(matches!(
            monitor.set_window(Window::Gaussian { sigma: 0.0 }),
            Err(MonitorError::Config(ConfigError::GaussianSigma(_)))
        ));
        monitor.set_window(Window::Blackman).unwrap();

        monitor.resize_history(4).unwrap();
        for _ in 0..6 {
            monitor.push_frame(&vec![0.1; 512]).unwrap();
        }
        assert_eq!(monitor.history().snapshot().unwrap().samples.len(), 4);

        monitor.clear_history().unwrap();
        assert!(monitor.history().snapshot().unwrap().samples.is_empty());
        assert!(matches!(
            monitor.resize_history(1),
            Err(MonitorError::Config(ConfigError::HistoryCapacity(1)))
        ));
    }

    #[test]
    fn test_start_twice_fails_and_stop_restarts() {
        let (mut monitor, _producer) = SpectrumMonitor::new(config()).unwrap();
        monitor.start().unwrap();
        assert!(monitor.is_running());
        assert!(matches!(monitor.start(), Err(MonitorError::AlreadyRunning)));

        monitor.stop();
        assert!(!monitor.is_running());
        monitor.start().unwrap();
        monitor.stop();
    }
}
