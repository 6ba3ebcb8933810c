//! Monitor configuration

use crate::audio::rolling::{MAX_CAPACITY, MIN_CAPACITY};
use crate::audio::shared::DEFAULT_LOCK_TIMEOUT;
use crate::error::ConfigError;
use crate::spectrum::{next_power_of_two, Window};
use std::time::Duration;

/// Smallest accepted FFT size; keeps the magnitude spectrum longer than two bins
pub const MIN_FFT_SIZE: usize = 8;

pub const MAX_FFT_SIZE: usize = 1 << 20;

/// Scalar appended to the history buffer for every analyzed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistorySource {
    #[default]
    PeakEnergy,
    Rms,
    /// Spectral centroid in bins
    Centroid,
    Loudness,
    /// Every raw sample of the frame, oldest first
    Samples,
}

/// Spectrum monitor configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Requested FFT size; rounded up to a power of two
    pub fft_size: usize,

    /// Sample rate in Hz
    pub sample_rate: f32,

    /// Window applied before every transform
    pub window: Window,

    /// Initial capacity of the history buffer
    pub history_capacity: usize,

    /// Track min/max of the history automatically
    pub autoscaling: bool,

    pub history_source: HistorySource,

    /// Bounded wait for every shared lock and frame slot
    pub lock_timeout: Duration,

    /// Frames that may be in flight towards the presenter
    pub frame_slots: usize,

    /// Samples the capture feed holds before dropping input
    pub feed_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            sample_rate: 48000.0,
            window: Window::Hanning,
            history_capacity: 1000,
            autoscaling: true,
            history_source: HistorySource::PeakEnergy,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            frame_slots: 3,
            feed_capacity: 96000,
        }
    }
}

impl MonitorConfig {
    /// FFT size the engine will actually use
    pub fn effective_fft_size(&self) -> usize {
        next_power_of_two(self.fft_size.max(2))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size) {
            return Err(ConfigError::FftSize(self.fft_size));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ConfigError::SampleRate(self.sample_rate));
        }
        if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&self.history_capacity) {
            return Err(ConfigError::HistoryCapacity(self.history_capacity));
        }
        if self.frame_slots == 0 {
            return Err(ConfigError::FrameSlots);
        }
        if self.lock_timeout.is_zero() {
            return Err(ConfigError::LockTimeout);
        }
        self.window.validate()?;

        let fft_size = self.effective_fft_size();
        if self.feed_capacity < fft_size {
            return Err(ConfigError::FeedCapacity {
                feed: self.feed_capacity,
                fft_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = MonitorConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.effective_fft_size(), 2048);
    }

    #[test]
    fn test_effective_size_rounds_up() {
        let config = MonitorConfig { fft_size: 1000, ..Default::default() };
        assert_eq!(config.effective_fft_size(), 1024);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            (MonitorConfig { fft_size: 4, ..Default::default() }, ConfigError::FftSize(4)),
            (MonitorConfig { sample_rate: 0.0, ..Default::default() }, ConfigError::SampleRate(0.0)),
            (MonitorConfig { history_capacity: 1, ..Default::default() }, ConfigError::HistoryCapacity(1)),
            (MonitorConfig { frame_slots: 0, ..Default::default() }, ConfigError::FrameSlots),
            (MonitorConfig { lock_timeout: Duration::ZERO, ..Default::default() }, ConfigError::LockTimeout),
            (
                MonitorConfig { window: Window::Gaussian { sigma: 0.9 }, ..Default::default() },
                ConfigError::GaussianSigma(0.9),
            ),
            (
                MonitorConfig { fft_size: 3000, feed_capacity: 3000, ..Default::default() },
                ConfigError::FeedCapacity { feed: 3000, fft_size: 4096 },
            ),
        ];

        for (config, expected) in cases {
            assert_eq!(config.validate(), Err(expected));
        }
    }

    #[test]
    fn test_nan_sample_rate_rejected() {
        let config = MonitorConfig { sample_rate: f32::NAN, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::SampleRate(_))));
    }
}
