//! Deterministic voice-like reference signals.

use std::f64::consts::PI;

use rand::Rng;

use crate::convolve::convolve;
use crate::error::CodecResult;
use crate::filter::FirKernel;
use crate::normalize::normalize_peak;
use crate::rng::create_keyed_rng;

/// Linear sine sweep.
///
/// # Arguments
/// * `start_hz` - Frequency at the first sample
/// * `end_hz` - Frequency reached after `seconds`
/// * `seconds` - Duration
/// * `sample_rate` - Sample rate in Hz
/// * `amplitude` - Peak amplitude
pub fn linear_sweep(
    start_hz: f64,
    end_hz: f64,
    seconds: f64,
    sample_rate: u32,
    amplitude: f64,
) -> Vec<f64> {
    let rate = sample_rate as f64;
    let len = (seconds * rate).round().max(0.0) as usize;
    let slope = if seconds > 0.0 {
        (end_hz - start_hz) / seconds
    } else {
        0.0
    };

    (0..len)
        .map(|n| {
            let t = n as f64 / rate;
            let phase = 2.0 * PI * (start_hz * t + 0.5 * slope * t * t);
            amplitude * phase.sin()
        })
        .collect()
}

/// Gliding pitch with `harmonics` partials at levels 1/h, like a voiced
/// vowel, peak-normalized to `amplitude`.
///
/// The fundamental moves linearly from `start_hz` to `end_hz`.
pub fn harmonic_glide(
    start_hz: f64,
    end_hz: f64,
    seconds: f64,
    sample_rate: u32,
    harmonics: usize,
    amplitude: f64,
) -> Vec<f64> {
    let rate = sample_rate as f64;
    let len = (seconds * rate).round().max(0.0) as usize;
    let slope = if seconds > 0.0 {
        (end_hz - start_hz) / seconds
    } else {
        0.0
    };

    let mut glide: Vec<f64> = (0..len)
        .map(|n| {
            let t = n as f64 / rate;
            let phase = 2.0 * PI * (start_hz * t + 0.5 * slope * t * t);
            (1..=harmonics)
                .map(|h| (h as f64 * phase).sin() / h as f64)
                .sum()
        })
        .collect();
    normalize_peak(&mut glide, amplitude);
    glide
}

/// Constant sine tone.
pub fn tone(hz: f64, seconds: f64, sample_rate: u32, amplitude: f64) -> Vec<f64> {
    linear_sweep(hz, hz, seconds, sample_rate, amplitude)
}

/// Band-limited white noise, seeded and peak-normalized to `amplitude`.
///
/// # Arguments
/// * `seed` - RNG seed; the same seed always gives the same burst
/// * `seconds` - Duration
/// * `sample_rate` - Sample rate in Hz
/// * `cutoff_hz` - Upper band edge
/// * `amplitude` - Peak amplitude
pub fn noise_burst(
    seed: u32,
    seconds: f64,
    sample_rate: u32,
    cutoff_hz: f64,
    amplitude: f64,
) -> CodecResult<Vec<f64>> {
    let rate = sample_rate as f64;
    let kernel = FirKernel::sinc_lowpass(cutoff_hz, 255, rate)?;
    let len = (seconds * rate).round().max(0.0) as usize;

    let mut rng = create_keyed_rng(seed, "noise_burst");
    let white: Vec<f64> = (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect();

    let mut burst = convolve(&white, &kernel);
    normalize_peak(&mut burst, amplitude);
    Ok(burst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::dominant_frequency_hz;
    use crate::normalize::peak;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sweep_frequency_rises() {
        let sweep = linear_sweep(200.0, 800.0, 1.0, 44100, 0.8);
        assert_eq!(sweep.len(), 44100);
        let early = dominant_frequency_hz(&sweep[..4410], 44100);
        let late = dominant_frequency_hz(&sweep[39690..], 44100);
        assert!((early - 230.0).abs() < 10.0, "early {}", early);
        assert!((late - 770.0).abs() < 10.0, "late {}", late);
        assert!(peak(&sweep) <= 0.8);
    }

    #[test]
    fn test_tone_length() {
        assert_eq!(tone(440.0, 0.5, 8000, 1.0).len(), 4000);
        assert!(tone(440.0, 0.0, 8000, 1.0).is_empty());
    }

    #[test]
    fn test_harmonic_glide_spectrum() {
        let glide = harmonic_glide(150.0, 150.0, 0.5, 44100, 5, 0.8);
        assert_eq!(glide.len(), 22050);
        assert!((peak(&glide) - 0.8).abs() < 1e-12);
        // Partial sums of sin(hφ)/h cross zero twice per period.
        let fundamental = dominant_frequency_hz(&glide, 44100);
        assert!((fundamental - 150.0).abs() < 5.0, "fundamental {}", fundamental);
        assert!(harmonic_glide(150.0, 250.0, 0.5, 44100, 0, 0.8)
            .iter()
            .all(|&s| s == 0.0));
    }

    #[test]
    fn test_noise_is_deterministic() {
        let a = noise_burst(9, 0.1, 44100, 2000.0, 0.7).unwrap();
        let b = noise_burst(9, 0.1, 44100, 2000.0, 0.7).unwrap();
        let c = noise_burst(10, 0.1, 44100, 2000.0, 0.7).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!((peak(&a) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_noise_rejects_bad_cutoff() {
        assert!(noise_burst(1, 0.1, 8000, 5000.0, 1.0).is_err());
    }
}
