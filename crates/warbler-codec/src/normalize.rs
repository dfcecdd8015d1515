//! Level utilities: peak and energy measurement, normalization, DC removal
//! and the clipping guard.
//!
//! All in-place helpers skip the divide on silent input, so they never
//! produce NaN or infinity.

use tracing::warn;

/// Largest absolute sample value, 0.0 for an empty buffer.
pub fn peak(samples: &[f64]) -> f64 {
    samples.iter().map(|s| s.abs()).fold(0.0_f64, f64::max)
}

/// Mean of the squared samples, 0.0 for an empty buffer.
pub fn mean_square(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64
}

/// Root mean square level.
pub fn rms(samples: &[f64]) -> f64 {
    mean_square(samples).sqrt()
}

/// Scales `samples` so the peak equals `target`.
///
/// Silence and buffers already at `target` are left untouched. Returns the
/// gain that was applied (1.0 when nothing changed).
///
/// # Arguments
/// * `samples` - Buffer to normalize in place
/// * `target` - Desired peak amplitude
pub fn normalize_peak(samples: &mut [f64], target: f64) -> f64 {
    let current = peak(samples);
    if current <= 0.0 || (current - target).abs() <= f64::EPSILON * target {
        return 1.0;
    }

    let gain = target / current;
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
    gain
}

/// Subtracts the mean. Returns the removed offset.
pub fn remove_dc(samples: &mut [f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    for sample in samples.iter_mut() {
        *sample -= mean;
    }
    mean
}

/// Rescales the buffer to unity peak if anything exceeds 1.0.
///
/// Returns true if the buffer was rescaled.
pub fn clip_guard(samples: &mut [f64]) -> bool {
    let current = peak(samples);
    if current <= 1.0 {
        return false;
    }

    warn!(peak = current, "output exceeds unity peak, rescaling");
    let gain = 1.0 / current;
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
    true
}
