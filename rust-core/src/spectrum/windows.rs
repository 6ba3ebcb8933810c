//! Window functions for spectral analysis
//!
//! Hanning, Hamming and Blackman use the periodic closed forms over `N`;
//! the remaining kinds are evaluated directly and divide by `N - 1`, so
//! callers must pass `length >= 2` for them.

use crate::error::ConfigError;
use std::f64::consts::PI;
use std::fmt;

/// Window function kinds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Window {
    /// w[i] = 0.5 - 0.5*cos(2πi/N)
    #[default]
    Hanning,

    /// w[i] = 0.54 - 0.46*cos(2πi/N)
    Hamming,

    /// w[i] = 0.42 - 0.5*cos(2πi/N) + 0.08*cos(4πi/N)
    Blackman,

    /// w[i] = exp(-0.5 * ((i - (N-1)/2) / (σ(N-1)/2))²), 0 < σ <= 0.5
    Gaussian { sigma: f64 },

    /// w[i] = 2/(N-1) * ((N-1)/2 - |i - (N-1)/2|)
    Bartlett,

    /// w[i] = 1 - |i - (N-1)/2| / (N/2)
    Triangle,

    /// w[i] = sinc(π(2i/(N-1) - 1))
    Lanczos,

    /// w[i] = 1
    Rectangle,

    /// w[i] = sin(πi/(N-1))
    Cosine,
}

impl Window {
    /// Check parameters without generating anything
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Window::Gaussian { sigma } if !(sigma > 0.0 && sigma <= 0.5) => {
                Err(ConfigError::GaussianSigma(sigma))
            }
            _ => Ok(()),
        }
    }

    /// Generate `length` coefficients
    ///
    /// # Panics
    /// For a Gaussian window whose sigma is outside (0, 0.5].
    pub fn coefficients(&self, length: usize) -> Vec<f64> {
        let n = length as f64;
        let centre = (n - 1.0) / 2.0;

        (0..length)
            .map(|i| {
                let x = i as f64;
                match *self {
                    Window::Hanning => 0.5 - 0.5 * (2.0 * PI * x / n).cos(),
                    Window::Hamming => 0.54 - 0.46 * (2.0 * PI * x / n).cos(),
                    Window::Blackman => {
                        0.42 - 0.5 * (2.0 * PI * x / n).cos() + 0.08 * (4.0 * PI * x / n).cos()
                    }
                    Window::Gaussian { sigma } => {
                        assert!(
                            sigma > 0.0 && sigma <= 0.5,
                            "gaussian sigma must be in (0, 0.5], got {sigma}"
                        );
                        let z = (x - centre) / (sigma * (n - 1.0) / 2.0);
                        (-0.5 * z * z).exp()
                    }
                    Window::Bartlett => 2.0 / (n - 1.0) * (centre - (x - centre).abs()),
                    Window::Triangle => 1.0 - (x - centre).abs() / (n / 2.0),
                    Window::Lanczos => sinc(PI * (2.0 * x / (n - 1.0) - 1.0)),
                    Window::Rectangle => 1.0,
                    Window::Cosine => (PI * x / (n - 1.0)).sin(),
                }
            })
            .collect()
    }

    /// Single-precision coefficients, as cached by the FFT engine
    pub fn coefficients_f32(&self, length: usize) -> Vec<f32> {
        self.coefficients(length).into_iter().map(|w| w as f32).collect()
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::Hanning => write!(f, "hanning"),
            Window::Hamming => write!(f, "hamming"),
            Window::Blackman => write!(f, "blackman"),
            Window::Gaussian { sigma } => write!(f, "gaussian(σ={sigma})"),
            Window::Bartlett => write!(f, "bartlett"),
            Window::Triangle => write!(f, "triangle"),
            Window::Lanczos => write!(f, "lanczos"),
            Window::Rectangle => write!(f, "rectangle"),
            Window::Cosine => write!(f, "cosine"),
        }
    }
}

/// Normalised-by-argument sinc: sin(x)/x, with sinc(0) = 1
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        x.sin() / x
    }
}

/// Generate window coefficients
///
/// # Arguments
/// * `window` - Window kind
/// * `length` - Number of samples (N)
///
/// # Returns
/// Vector of coefficients w[i] for i = 0..N-1
pub fn generate_window(window: Window, length: usize) -> Vec<f64> {
    window.coefficients(length)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-10, "{a} != {b}");
    }

    #[test]
    fn test_every_kind_has_requested_length() {
        let kinds = [
            Window::Hanning,
            Window::Hamming,
            Window::Blackman,
            Window::Gaussian { sigma: 0.4 },
            Window::Bartlett,
            Window::Triangle,
            Window::Lanczos,
            Window::Rectangle,
            Window::Cosine,
        ];
        for kind in kinds {
            assert_eq!(kind.coefficients(64).len(), 64, "{kind}");
            assert_eq!(kind.coefficients_f32(17).len(), 17, "{kind}");
        }
    }

    #[test]
    fn test_periodic_trig_windows() {
        let n = 16;
        let hann = generate_window(Window::Hanning, n);
        let hamming = generate_window(Window::Hamming, n);
        let blackman = generate_window(Window::Blackman, n);

        // Periodic form: zero (or the pedestal) at i = 0, peak at N/2
        assert_close(hann[0], 0.0);
        assert_close(hann[n / 2], 1.0);
        assert_close(hamming[0], 0.08);
        assert_close(hamming[n / 2], 1.0);
        assert_close(blackman[0], 0.0);
        assert_close(blackman[n / 2], 1.0);

        // Symmetric around N/2
        for i in 1..n / 2 {
            assert_close(hann[i], hann[n - i]);
            assert_close(blackman[i], blackman[n - i]);
        }
    }

    #[test]
    fn test_trig_windows_accept_length_one() {
        assert_eq!(Window::Hanning.coefficients(1), vec![0.0]);
        assert!(Window::Hamming.coefficients(1)[0].is_finite());
    }

    #[test]
    fn test_bartlett_and_triangle() {
        let bartlett = generate_window(Window::Bartlett, 5);
        for (got, want) in bartlett.iter().zip([0.0, 0.5, 1.0, 0.5, 0.0]) {
            assert_close(*got, want);
        }

        // Triangle never reaches zero at the ends
        let triangle = generate_window(Window::Triangle, 4);
        for (got, want) in triangle.iter().zip([0.25, 0.75, 0.75, 0.25]) {
            assert_close(*got, want);
        }
    }

    #[test]
    fn test_lanczos_and_cosine() {
        let lanczos = generate_window(Window::Lanczos, 5);
        assert_close(lanczos[2], 1.0);
        assert!(lanczos[0].abs() < 1e-12);
        assert!(lanczos[4].abs() < 1e-12);

        let cosine = generate_window(Window::Cosine, 5);
        assert!(cosine[0].abs() < 1e-12);
        assert_close(cosine[2], 1.0);
    }

    #[test]
    fn test_gaussian() {
        let n = 9;
        let sigma = 0.5;
        let gauss = generate_window(Window::Gaussian { sigma }, n);
        assert_close(gauss[4], 1.0);
        // Ends sit 1/σ = 2 standard deviations from the centre
        assert_close(gauss[0], (-0.5f64 * 4.0).exp());
        assert_close(gauss[0], gauss[8]);
    }

    #[test]
    fn test_rectangle() {
        let window = generate_window(Window::Rectangle, 100);
        assert!(window.iter().all(|&w| w == 1.0));
    }

    #[test]
    fn test_validate_gaussian_sigma() {
        assert!(Window::Gaussian { sigma: 0.5 }.validate().is_ok());
        assert_eq!(
            Window::Gaussian { sigma: 0.0 }.validate(),
            Err(ConfigError::GaussianSigma(0.0))
        );
        assert!(Window::Gaussian { sigma: 0.75 }.validate().is_err());
        assert!(Window::Blackman.validate().is_ok());
    }

    #[test]
    #[should_panic(expected = "gaussian sigma")]
    fn test_gaussian_sigma_out_of_range_panics() {
        Window::Gaussian { sigma: 0.9 }.coefficients(8);
    }

    #[test]
    fn test_sinc_at_zero() {
        assert_eq!(sinc(0.0), 1.0);
        assert!(sinc(PI).abs() < 1e-15);
    }
}
