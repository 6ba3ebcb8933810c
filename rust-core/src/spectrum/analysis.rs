//! Frame analyzer
//!
//! Combines the FFT engine with the current frame so that spectral
//! descriptors read the magnitude spectrum and temporal descriptors read the
//! time-domain frame.

use super::fft::{FftEngine, SpectrumResult};
use super::windows::Window;
use crate::features;

/// Scalar descriptors of one analyzed frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Descriptors {
    // Temporal, over the frame
    pub peak_energy: f32,
    pub rms: f32,
    pub zero_crossings: usize,
    pub loudness: f32,

    // Spectral, over the magnitude spectrum
    pub centroid: f32,
    pub rolloff: f32,
    pub flatness: f32,
    pub kurtosis: f32,
    pub skewness: f32,
    pub spread: f32,
    pub crest: f32,
}

impl Descriptors {
    /// Compute every descriptor from a frame and its magnitude spectrum
    ///
    /// # Panics
    /// If `magnitude` has two bins or fewer (rolloff is undefined).
    pub fn compute(frame: &[f32], magnitude: &[f32]) -> Self {
        let moments = features::central_moments(magnitude);
        let (kurtosis, skewness) = if moments.m2 == 0.0 {
            (-3.0, 0.0)
        } else {
            (
                moments.m4 / (moments.m2 * moments.m2) - 3.0,
                moments.m3 / moments.m2.powf(1.5),
            )
        };

        Self {
            peak_energy: features::peak_energy(frame),
            rms: features::root_mean_square(frame),
            zero_crossings: features::zero_crossing_rate(frame),
            loudness: features::loudness(frame),
            centroid: features::centroid(magnitude),
            rolloff: features::rolloff(magnitude, features::DEFAULT_ROLLOFF_CUTOFF),
            flatness: features::flatness(magnitude),
            kurtosis,
            skewness,
            spread: moments.m2,
            crest: features::crest(magnitude),
        }
    }
}

/// FFT engine plus the frame it last analyzed
pub struct Analyzer {
    engine: FftEngine,
    current: Vec<f32>,
    has_frame: bool,
}

impl Analyzer {
    /// Create new analyzer
    pub fn new(fft_size: usize, sample_rate: f32, window: Window) -> Self {
        let engine = FftEngine::new(fft_size, sample_rate, window);
        let current = vec![0.0; engine.fft_size()];

        Self {
            engine,
            current,
            has_frame: false,
        }
    }

    /// Keep a copy of `frame` and transform it
    ///
    /// # Panics
    /// If `frame.len()` differs from the FFT size.
    pub fn process(&mut self, frame: &[f32]) -> SpectrumResult<'_> {
        self.current.copy_from_slice(frame);
        self.has_frame = true;
        self.engine.transform(frame)
    }

    /// Rebuild the engine for a new size and forget the current frame
    pub fn resize(&mut self, fft_size: usize, sample_rate: f32) {
        self.engine.resize(fft_size, sample_rate);
        self.current = vec![0.0; self.engine.fft_size()];
        self.has_frame = false;
    }

    pub fn set_window(&mut self, window: Window) {
        self.engine.set_window(window);
        self.has_frame = false;
    }

    pub fn engine(&self) -> &FftEngine {
        &self.engine
    }

    pub fn spectrum(&self) -> SpectrumResult<'_> {
        self.engine.result()
    }

    pub fn magnitude(&self) -> &[f32] {
        self.engine.magnitude()
    }

    /// The frame last passed to [`Analyzer::process`]
    pub fn current_frame(&self) -> Option<&[f32]> {
        self.has_frame.then_some(self.current.as_slice())
    }

    fn frame(&self) -> &[f32] {
        match self.current_frame() {
            Some(frame) => frame,
            None => panic!("no frame to analyze: call process first"),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.engine.fft_size()
    }

    pub fn num_bins(&self) -> usize {
        self.engine.num_bins()
    }

    pub fn sample_rate(&self) -> f32 {
        self.engine.sample_rate()
    }

    // Temporal descriptors

    pub fn peak_energy(&self) -> f32 {
        features::peak_energy(self.frame())
    }

    pub fn root_mean_square(&self) -> f32 {
        features::root_mean_square(self.frame())
    }

    pub fn zero_crossing_rate(&self) -> usize {
        features::zero_crossing_rate(self.frame())
    }

    pub fn loudness(&self) -> f32 {
        features::loudness(self.frame())
    }

    // Spectral descriptors

    pub fn rolloff(&self) -> f32 {
        features::rolloff(self.magnitude(), features::DEFAULT_ROLLOFF_CUTOFF)
    }

    pub fn flatness(&self) -> f32 {
        features::flatness(self.magnitude())
    }

    /// Spectral centroid in bins; see [`FftEngine::bin_to_hz`] for Hz
    pub fn centroid(&self) -> f32 {
        features::centroid(self.magnitude())
    }

    pub fn kurtosis(&self) -> f32 {
        features::kurtosis(self.magnitude())
    }

    pub fn skewness(&self) -> f32 {
        features::skewness(self.magnitude())
    }

    pub fn spread(&self) -> f32 {
        features::spread(self.magnitude())
    }

    pub fn crest(&self) -> f32 {
        features::crest(self.magnitude())
    }

    /// All descriptors of the current frame
    ///
    /// # Panics
    /// If nothing has been processed yet.
    pub fn descriptors(&self) -> Descriptors {
        Descriptors::compute(self.frame(), self.magnitude())
    }
}
