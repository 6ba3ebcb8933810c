//! Windowing of time-domain frames before the FFT
//!
//! Applies windows to frames to reduce spectral leakage

use super::windows::Window;

/// Apply window to a frame
///
/// # Arguments
/// * `frame` - Input frame (left untouched)
/// * `window` - Window kind
///
/// # Returns
/// Windowed copy of the frame
pub fn apply_window(frame: &[f32], window: Window) -> Vec<f32> {
    let coefficients = window.coefficients(frame.len());

    frame
        .iter()
        .zip(coefficients.iter())
        .map(|(&s, &w)| (s as f64 * w) as f32)
        .collect()
}

/// Apply window in-place
pub fn apply_window_inplace(frame: &mut [f32], window: Window) {
    let coefficients = window.coefficients(frame.len());

    for (s, w) in frame.iter_mut().zip(coefficients.iter()) {
        *s = (*s as f64 * w) as f32;
    }
}

/// Multiply `frame` by precomputed coefficients into `out`
///
/// Used on the real-time path where the coefficients are cached and
/// `out` is preallocated scratch.
#[inline]
pub(crate) fn window_into(frame: &[f32], coefficients: &[f32], out: &mut [f32]) {
    for ((o, &s), &w) in out.iter_mut().zip(frame).zip(coefficients) {
        *o = s * w;
    }
}

/// Calculate window amplitude correction factor
///
/// Windowing reduces the amplitude of a tone; multiplying the FFT
/// magnitude by this factor (N / Σw) restores it.
pub fn window_correction_factor(window: Window, length: usize) -> f64 {
    let sum: f64 = window.coefficients(length).iter().sum();
    length as f64 / sum
}

/// Calculate window power correction factor (N / Σw²)
pub fn window_power_correction_factor(window: Window, length: usize) -> f64 {
    let sum_sq: f64 = window.coefficients(length).iter().map(|&w| w * w).sum();
    length as f64 / sum_sq
}
