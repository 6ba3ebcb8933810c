//! Spectral and temporal descriptors
//!
//! Pure functions over a frame or a magnitude spectrum. Statistics are
//! population statistics (divide by N). Sums and moments accumulate in f64,
//! so a constant input yields central moments of exactly zero.

/// Default cutoff for [`rolloff`]
pub const DEFAULT_ROLLOFF_CUTOFF: f32 = 0.85;

/// Below this level [`amp`] returns 0
pub const SILENCE_FLOOR_DB: f32 = -150.0;

/// Peak level under which a frame counts as silent
pub const SILENCE_CUTOFF: f32 = 1e-9;

const LN_10_OVER_20: f32 = std::f32::consts::LN_10 / 20.0;

#[inline]
fn sum_f64(x: &[f32]) -> f64 {
    x.iter().map(|&v| v as f64).sum()
}

/// Σx²
pub fn energy(x: &[f32]) -> f32 {
    x.iter().map(|&v| v as f64 * v as f64).sum::<f64>() as f32
}

/// sqrt(mean(x²)), intended for the time-domain frame
pub fn root_mean_square(x: &[f32]) -> f32 {
    instant_power(x).sqrt()
}

/// energy / N
pub fn instant_power(x: &[f32]) -> f32 {
    (x.iter().map(|&v| v as f64 * v as f64).sum::<f64>() / x.len() as f64) as f32
}

/// max |x|
pub fn peak_energy(x: &[f32]) -> f32 {
    x.iter().fold(0.0f32, |peak, &v| peak.max(v.abs()))
}

pub fn is_silent(x: &[f32]) -> bool {
    peak_energy(x) < SILENCE_CUTOFF
}

/// Stevens' power law loudness, energy^0.67
pub fn loudness(x: &[f32]) -> f32 {
    energy(x).powf(0.67)
}

pub fn mean(x: &[f32]) -> f32 {
    (sum_f64(x) / x.len() as f64) as f32
}

/// Element at N/2 of a sorted copy (upper middle for even N)
///
/// # Panics
/// On an empty input.
pub fn median(x: &[f32]) -> f32 {
    assert!(!x.is_empty(), "median of an empty array");
    let mut sorted = x.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    sorted[sorted.len() / 2]
}

/// exp(Σln(x) / N); NaN or zero when any element is <= 0
pub fn geometric_mean(x: &[f32]) -> f32 {
    let log_sum: f64 = x.iter().map(|&v| (v as f64).ln()).sum();
    (log_sum / x.len() as f64).exp() as f32
}

/// Geometric over arithmetic mean of x + 1
///
/// The +1 bias keeps zero bins from collapsing the geometric mean.
pub fn flatness(x: &[f32]) -> f32 {
    let n = x.len() as f64;
    let log_sum: f64 = x.iter().map(|&v| (v as f64 + 1.0).ln()).sum();
    let arithmetic: f64 = x.iter().map(|&v| v as f64 + 1.0).sum::<f64>() / n;
    ((log_sum / n).exp() / arithmetic) as f32
}

/// Power mean: harmonic at -1, geometric at 0, arithmetic at 1, RMS at 2
pub fn power_mean(x: &[f32], power: f32) -> f32 {
    if power == 0.0 {
        return geometric_mean(x);
    }
    let p = power as f64;
    let mean_of_powers: f64 = x.iter().map(|&v| (v as f64).powf(p)).sum::<f64>() / x.len() as f64;
    mean_of_powers.powf(1.0 / p) as f32
}

/// Σ(i·x[i]) / Σx[i], weights are bin indices; 0 when Σx <= 0
pub fn centroid(x: &[f32]) -> f32 {
    let total = sum_f64(x);
    if total > 0.0 {
        let weighted: f64 = x
            .iter()
            .enumerate()
            .map(|(i, &v)| i as f64 * v as f64)
            .sum();
        (weighted / total) as f32
    } else {
        0.0
    }
}

/// Fraction of the array below which `cutoff` of the total is contained
///
/// Returns `i / N` for the first `i` whose running sum exceeds
/// `cutoff · Σx`, or 0 if none does.
///
/// # Panics
/// If `x` has two elements or fewer.
pub fn rolloff(x: &[f32], cutoff: f32) -> f32 {
    assert!(x.len() > 2, "rolloff needs more than two elements");

    let threshold = sum_f64(x) * cutoff as f64;
    let mut running = 0.0f64;
    let index = x
        .iter()
        .position(|&v| {
            running += v as f64;
            running > threshold
        })
        .unwrap_or(0);

    index as f32 / x.len() as f32
}

/// Central moments about the mean, population normalised
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralMoments {
    pub m0: f32,
    pub m1: f32,
    pub m2: f32,
    pub m3: f32,
    pub m4: f32,
}

/// # Panics
/// If `x` has fewer than two elements.
pub fn central_moments(x: &[f32]) -> CentralMoments {
    assert!(x.len() >= 2, "central moments need at least two elements");

    let n = x.len() as f64;
    let mean = sum_f64(x) / n;

    let (mut s2, mut s3, mut s4) = (0.0f64, 0.0f64, 0.0f64);
    for &v in x {
        let d = v as f64 - mean;
        let d2 = d * d;
        s2 += d2;
        s3 += d2 * d;
        s4 += d2 * d2;
    }

    CentralMoments {
        m0: 1.0,
        m1: 0.0,
        m2: (s2 / n) as f32,
        m3: (s3 / n) as f32,
        m4: (s4 / n) as f32,
    }
}

/// Excess kurtosis m4/m2² - 3; -3 for a constant input
pub fn kurtosis(x: &[f32]) -> f32 {
    let m = central_moments(x);
    if m.m2 == 0.0 {
        -3.0
    } else {
        m.m4 / (m.m2 * m.m2) - 3.0
    }
}

/// m3 / m2^1.5; 0 for a constant input
pub fn skewness(x: &[f32]) -> f32 {
    let m = central_moments(x);
    if m.m2 == 0.0 {
        0.0
    } else {
        m.m3 / m.m2.powf(1.5)
    }
}

/// Second central moment
pub fn spread(x: &[f32]) -> f32 {
    central_moments(x).m2
}

/// max(x) / mean(x), or 1 for a zero-energy input
///
/// Not the peak/RMS crest factor.
pub fn crest(x: &[f32]) -> f32 {
    if energy(x) > 0.0 {
        let max = x.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        max / mean(x)
    } else {
        1.0
    }
}

/// Number of sign changes between consecutive samples
pub fn zero_crossing_rate(x: &[f32]) -> usize {
    x.windows(2)
        .filter(|pair| pair[0].is_sign_negative() != pair[1].is_sign_negative())
        .count()
}

/// Length of `x` in seconds
pub fn duration(x: &[f32], sample_rate: f32) -> f32 {
    x.len() as f32 / sample_rate
}

/// Amplitude to decibels, 20·log10(amp)
pub fn db(amp: f32) -> f32 {
    20.0 * amp.log10()
}

/// Decibels to amplitude, hard floor at -150 dB
pub fn amp(db: f32) -> f32 {
    if db > SILENCE_FLOOR_DB {
        (db * LN_10_OVER_20).exp()
    } else {
        0.0
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn db_amp_round_trip(d in -149.0f32..120.0) {
            let back = db(amp(d));
            prop_assert!((back - d).abs() < 1e-3, "{} -> {}", d, back);
        }

        #[test]
        fn amp_floor(d in -1000.0f32..=-150.0) {
            prop_assert_eq!(amp(d), 0.0);
        }

        #[test]
        fn constant_input_hits_fallbacks(value in 0.0f32..1000.0, len in 2usize..512) {
            let x = vec![value; len];
            prop_assert_eq!(kurtosis(&x), -3.0);
            prop_assert_eq!(skewness(&x), 0.0);
            let f = flatness(&x);
            let c = crest(&x);
            prop_assert!(!f.is_nan() && (f - 1.0).abs() < 1e-4, "flatness {}", f);
            prop_assert!(!c.is_nan() && (c - 1.0).abs() < 1e-6, "crest {}", c);
        }

        #[test]
        fn rolloff_in_unit_range(x in proptest::collection::vec(0.0f32..10.0, 3..256)) {
            let r = rolloff(&x, DEFAULT_ROLLOFF_CUTOFF);
            prop_assert!((0.0..1.0).contains(&r));
        }

        #[test]
        fn centroid_within_bins(x in proptest::collection::vec(0.0f32..10.0, 1..256)) {
            let c = centroid(&x);
            prop_assert!(c >= 0.0 && c <= (x.len() - 1) as f32 + 1e-3);
        }
    }
}
