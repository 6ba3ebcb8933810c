//! Windowed real-FFT engine
//!
//! A real frame of `n` samples is packed into `n/2` complex pairs (even
//! samples as real parts, odd samples as imaginary parts), transformed with a
//! half-size complex FFT, and split back into the real spectrum. The split
//! follows the packed convention where DC and Nyquist share bin 0 and every
//! value comes out doubled; the engine unpacks Nyquist, halves everything and
//! mirrors the upper half of the bins so the arrays plot symmetrically.

use super::windowing::window_into;
use super::windows::Window;
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Smallest power of two >= `value` (0 rounds up to 1)
pub fn next_power_of_two(value: usize) -> usize {
    value.max(1).next_power_of_two()
}

pub fn is_power_of_two(value: usize) -> bool {
    value.is_power_of_two()
}

/// Spectrum produced by the most recent [`FftEngine::transform`]
///
/// Borrows the engine's scratch; the next transform overwrites it. Use
/// [`SpectrumResult::to_snapshot`] to keep a copy.
#[derive(Debug, Clone, Copy)]
pub struct SpectrumResult<'a> {
    pub real: &'a [f32],
    pub imaginary: &'a [f32],
    pub magnitude: &'a [f32],
    /// Real part of the Nyquist bin, unpacked from bin 0
    pub nyquist: f32,
}

impl SpectrumResult<'_> {
    pub fn num_bins(&self) -> usize {
        self.magnitude.len()
    }

    pub fn to_snapshot(&self) -> SpectrumSnapshot {
        SpectrumSnapshot {
            real: self.real.to_vec(),
            imaginary: self.imaginary.to_vec(),
            magnitude: self.magnitude.to_vec(),
            nyquist: self.nyquist,
        }
    }
}

/// Caller-owned copy of a [`SpectrumResult`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumSnapshot {
    pub real: Vec<f32>,
    pub imaginary: Vec<f32>,
    pub magnitude: Vec<f32>,
    pub nyquist: f32,
}

/// FFT engine for real-valued frames
pub struct FftEngine {
    /// FFT size (power of two)
    n: usize,

    /// Number of bins returned (n / 2)
    half_n: usize,

    log2n: u32,

    sample_rate: f32,

    window: Window,

    /// Window coefficients for `n`
    window_coefficients: Vec<f32>,

    /// Complex FFT of size n/2; `None` until the first resize
    fft: Option<Arc<dyn Fft<f32>>>,

    /// exp(-2πik/n) for k in 0..n/2
    twiddles: Vec<Complex<f32>>,

    /// Reusable buffers
    windowed: Vec<f32>,
    packed: Vec<Complex<f32>>,
    fft_scratch: Vec<Complex<f32>>,

    real: Vec<f32>,
    imaginary: Vec<f32>,
    magnitude: Vec<f32>,
    nyquist_bin: f32,
}

impl Default for FftEngine {
    /// An engine with no transform state; call [`FftEngine::resize`] before use
    fn default() -> Self {
        Self {
            n: 0,
            half_n: 0,
            log2n: 0,
            sample_rate: 0.0,
            window: Window::default(),
            window_coefficients: Vec::new(),
            fft: None,
            twiddles: Vec::new(),
            windowed: Vec::new(),
            packed: Vec::new(),
            fft_scratch: Vec::new(),
            real: Vec::new(),
            imaginary: Vec::new(),
            magnitude: Vec::new(),
            nyquist_bin: 0.0,
        }
    }
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `size` - Requested FFT size, rounded up to a power of two
    /// * `sample_rate` - Sample rate in Hz
    /// * `window` - Window applied to every frame
    pub fn new(size: usize, sample_rate: f32, window: Window) -> Self {
        let mut engine = Self {
            window,
            ..Self::default()
        };
        engine.resize(size, sample_rate);
        engine
    }

    /// Discard transform state and rebuild it for a new size
    ///
    /// Allocates; keep it off the real-time path.
    pub fn resize(&mut self, size: usize, sample_rate: f32) {
        let n = next_power_of_two(size.max(2));
        let half_n = n / 2;

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(half_n);

        self.n = n;
        self.half_n = half_n;
        self.log2n = n.trailing_zeros();
        self.sample_rate = sample_rate;
        self.window_coefficients = self.window.coefficients_f32(n);
        self.twiddles = (0..half_n)
            .map(|k| {
                let angle = -2.0 * PI * k as f64 / n as f64;
                Complex::new(angle.cos() as f32, angle.sin() as f32)
            })
            .collect();
        self.windowed = vec![0.0; n];
        self.packed = vec![Complex::new(0.0, 0.0); half_n];
        self.fft_scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        self.real = vec![0.0; half_n];
        self.imaginary = vec![0.0; half_n];
        self.magnitude = vec![0.0; half_n];
        self.nyquist_bin = 0.0;
        self.fft = Some(fft);

        log::debug!(
            "fft engine resized: requested {size}, n = {n}, {half_n} bins at {sample_rate} Hz"
        );
    }

    /// Change the window, keeping the FFT plan
    pub fn set_window(&mut self, window: Window) {
        self.window = window;
        if self.n > 0 {
            self.window_coefficients = window.coefficients_f32(self.n);
        }
        log::debug!("fft window set to {window}");
    }

    /// Window, pack, transform and unpack one frame
    ///
    /// # Panics
    /// If the engine was never resized, or `frame.len() != n`.
    pub fn transform(&mut self, frame: &[f32]) -> SpectrumResult<'_> {
        let Some(fft) = self.fft.as_ref() else {
            panic!("FFT not set up: call resize before transform");
        };
        assert_eq!(
            frame.len(),
            self.n,
            "frame length must equal the FFT size"
        );

        let half_n = self.half_n;

        // 1. Window into scratch (caller's frame untouched)
        window_into(frame, &self.window_coefficients, &mut self.windowed);

        // 2. Pack even/odd samples as complex pairs
        for (z, pair) in self.packed.iter_mut().zip(self.windowed.chunks_exact(2)) {
            *z = Complex::new(pair[0], pair[1]);
        }

        // 3. Half-size forward complex FFT
        fft.process_with_scratch(&mut self.packed, &mut self.fft_scratch);

        // Split into the doubled real spectrum, DC in real[0], Nyquist in imaginary[0]
        let z0 = self.packed[0];
        self.real[0] = 2.0 * (z0.re + z0.im);
        self.imaginary[0] = 2.0 * (z0.re - z0.im);
        for k in 1..half_n {
            let a = self.packed[k];
            let b = self.packed[half_n - k].conj();
            let even = a + b;
            let odd = Complex::new((a - b).im, -(a - b).re);
            let x = even + self.twiddles[k] * odd;
            self.real[k] = x.re;
            self.imaginary[k] = x.im;
        }

        // 4. Unpack Nyquist from bin 0
        self.nyquist_bin = self.imaginary[0];
        self.imaginary[0] = 0.0;

        // 5. Undo the packing's doubling
        for v in self.real.iter_mut().chain(self.imaginary.iter_mut()) {
            *v *= 0.5;
        }
        self.nyquist_bin *= 0.5;

        // 6. Mirror the upper half (conjugate symmetry)
        for k in half_n / 2 + 1..half_n {
            self.real[k] = self.real[half_n - k];
            self.imaginary[k] = -self.imaginary[half_n - k];
        }

        // 7. Magnitudes
        for ((m, &re), &im) in self
            .magnitude
            .iter_mut()
            .zip(&self.real)
            .zip(&self.imaginary)
        {
            *m = (re * re + im * im).sqrt();
        }

        self.result()
    }

    /// View of the last transform (zeros right after a resize)
    pub fn result(&self) -> SpectrumResult<'_> {
        SpectrumResult {
            real: &self.real,
            imaginary: &self.imaginary,
            magnitude: &self.magnitude,
            nyquist: self.nyquist_bin,
        }
    }

    pub fn magnitude(&self) -> &[f32] {
        &self.magnitude
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.n
    }

    /// Get number of bins (n / 2)
    pub fn num_bins(&self) -> usize {
        self.half_n
    }

    pub fn log2n(&self) -> u32 {
        self.log2n
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate / 2.0
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn is_ready(&self) -> bool {
        self.fft.is_some()
    }

    /// Centre frequency of a bin in Hz
    pub fn bin_to_hz(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate / self.n as f32
    }

    /// Get frequency axis in Hz, one entry per bin
    pub fn frequency_axis(&self) -> Vec<f32> {
        (0..self.half_n).map(|bin| self.bin_to_hz(bin)).collect()
    }
}
