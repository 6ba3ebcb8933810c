//! Spectral analysis with FFT

pub mod analysis;
pub mod fft;
pub mod windowing;
pub mod windows;

pub use analysis::{Analyzer, Descriptors};
pub use fft::{next_power_of_two, FftEngine, SpectrumResult, SpectrumSnapshot};
pub use windowing::apply_window;
pub use windows::{generate_window, Window};
