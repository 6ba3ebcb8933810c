//! Error types for the spectrum core
//!
//! Precondition violations (transform before resize, too-short feature
//! inputs) are panics, not variants here. These types cover what a caller
//! can recover from: a bounded wait that expired, or a bad configuration.

use std::time::Duration;
use thiserror::Error;

/// A bounded wait on a shared buffer or frame slot expired
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("timed out after {waited:?} waiting for shared state")]
pub struct TimedOut {
    pub waited: Duration,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("FFT size {0} out of range (expected 8..=1048576)")]
    FftSize(usize),

    #[error("Sample rate must be finite and positive (found: {0})")]
    SampleRate(f32),

    #[error("History capacity {0} out of range (expected 2..=2147483647)")]
    HistoryCapacity(usize),

    #[error("At least one frame slot is required")]
    FrameSlots,

    #[error("Lock timeout must be non-zero")]
    LockTimeout,

    #[error("Gaussian window sigma must be in (0, 0.5] (found: {0})")]
    GaussianSigma(f64),

    #[error("Feed capacity {feed} cannot hold one frame of {fft_size} samples")]
    FeedCapacity { feed: usize, fft_size: usize },
}

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Analysis thread is already running")]
    AlreadyRunning,

    #[error("Failed to spawn analysis thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Sample feed was lost with a previous analysis thread")]
    FeedLost,

    #[error(transparent)]
    Timeout(#[from] TimedOut),
}
