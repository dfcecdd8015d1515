//! Signal comparison and measurement helpers.

use std::ops::Range;

/// Zero-lag normalized cross-correlation of two signals, means removed.
///
/// Compares the common prefix. Returns 0.0 when either signal is constant
/// or empty.
pub fn normalized_cross_correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let mean_a = a.iter().sum::<f64>() / n as f64;
    let mean_b = b.iter().sum::<f64>() / n as f64;

    let mut cross = 0.0;
    let mut energy_a = 0.0;
    let mut energy_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (x - mean_a, y - mean_b);
        cross += x * y;
        energy_a += x * x;
        energy_b += y * y;
    }

    let denom = (energy_a * energy_b).sqrt();
    if denom > 0.0 {
        cross / denom
    } else {
        0.0
    }
}

/// Dominant frequency from the spacing of zero crossings, in Hz.
///
/// Crossing positions are linearly interpolated between samples. Returns
/// 0.0 when fewer than two crossings are found.
pub fn dominant_frequency_hz(signal: &[f64], sample_rate: u32) -> f64 {
    if signal.len() < 2 {
        return 0.0;
    }
    let mean = signal.iter().sum::<f64>() / signal.len() as f64;

    let mut first = None;
    let mut last = 0.0;
    let mut count = 0usize;
    for (k, pair) in signal.windows(2).enumerate() {
        let (a, b) = (pair[0] - mean, pair[1] - mean);
        if (a < 0.0 && b >= 0.0) || (a >= 0.0 && b < 0.0) {
            let position = k as f64 + a / (a - b);
            first.get_or_insert(position);
            last = position;
            count += 1;
        }
    }

    match first {
        Some(first) if count >= 2 && last > first => {
            (count - 1) as f64 / (2.0 * (last - first)) * sample_rate as f64
        }
        _ => 0.0,
    }
}

/// Index range left after trimming `trim` samples from each end.
///
/// Falls back to the whole range when the signal is too short to trim.
pub fn interior(len: usize, trim: usize) -> Range<usize> {
    if len > 2 * trim {
        trim..len - trim
    } else {
        0..len
    }
}
