//! Live Spectrum - real-time spectral analysis core
//!
//! Windowed real FFT, scalar audio descriptors and a rolling sample buffer,
//! shared between a real-time producer and a display consumer through
//! bounded-wait locks.

pub mod audio;
pub mod config;
pub mod error;
pub mod features;
pub mod spectrum;

pub use audio::{RollingBuffer, SharedRollingBuffer, SpectrumFrame, SpectrumMonitor};
pub use config::{HistorySource, MonitorConfig};
pub use error::{ConfigError, MonitorError, TimedOut};
pub use spectrum::{Analyzer, Descriptors, FftEngine, SpectrumResult, Window};
