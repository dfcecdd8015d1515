//! FM/AM demodulation of I/Q signals.
//!
//! Frequency contours are in radians per sample and have the same length as
//! their source. Sample 0 has no predecessor and copies sample 1.

use std::f64::consts::PI;

use crate::analytic::IqBuffer;

const TWO_PI: f64 = 2.0 * PI;

/// `atan2` with the degenerate `(0, 0)` case pinned to zero.
#[inline]
pub fn safe_atan2(y: f64, x: f64) -> f64 {
    if y == 0.0 && x == 0.0 {
        0.0
    } else {
        y.atan2(x)
    }
}

/// Instantaneous frequency from the angle between consecutive samples.
///
/// Uses `atan2(cross, dot)` of neighbouring phasors, which stays well
/// defined across the ±π boundary. Output range is (-π, π].
pub fn fm(iq: &IqBuffer) -> Vec<f64> {
    let n = iq.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![0.0];
    }

    let mut freq = vec![0.0; n];
    for k in 1..n {
        freq[k] = fm_step(iq.i[k - 1], iq.q[k - 1], iq.i[k], iq.q[k]);
    }
    freq[0] = freq[1];
    freq
}

/// One FM step between a previous and a current sample.
#[inline]
pub fn fm_step(prev_i: f64, prev_q: f64, i: f64, q: f64) -> f64 {
    let cross = i * prev_q - q * prev_i;
    let dot = i * prev_i + q * prev_q;
    safe_atan2(cross, dot)
}

/// Instantaneous amplitude (complex magnitude).
pub fn am(iq: &IqBuffer) -> Vec<f64> {
    iq.i.iter()
        .zip(&iq.q)
        .map(|(i, q)| (i * i + q * q).sqrt())
        .collect()
}

/// Sliding median with an edge-clamped window.
///
/// Removes isolated spikes from FM estimates. `window` is forced odd and at
/// least 1.
pub fn median_filter(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1) | 1;
    let half = window / 2;
    let n = values.len();
    let mut scratch = Vec::with_capacity(window);

    (0..n)
        .map(|k| {
            scratch.clear();
            for offset in 0..window {
                let idx = (k + offset).saturating_sub(half).min(n - 1);
                scratch.push(values[idx]);
            }
            scratch.sort_by(|a, b| a.total_cmp(b));
            scratch[half]
        })
        .collect()
}

/// Unwrapped instantaneous phase `atan2(Q, I)`.
///
/// Successive differences are wrapped into (-π, π] before integrating, so
/// the result is continuous and unbounded.
pub fn unwrap_phase(iq: &IqBuffer) -> Vec<f64> {
    let mut unwrapped = Vec::with_capacity(iq.len());
    let mut prev_raw = 0.0;
    let mut acc = 0.0;

    for (k, (&i, &q)) in iq.i.iter().zip(&iq.q).enumerate() {
        let raw = safe_atan2(q, i);
        if k == 0 {
            acc = raw;
        } else {
            acc += wrap_delta(raw - prev_raw);
        }
        prev_raw = raw;
        unwrapped.push(acc);
    }

    unwrapped
}

#[inline]
fn wrap_delta(mut delta: f64) -> f64 {
    while delta > PI {
        delta -= TWO_PI;
    }
    while delta <= -PI {
        delta += TWO_PI;
    }
    delta
}

/// Converts radians per sample to Hz.
pub fn rad_per_sample_to_hz(value: f64, sample_rate: f64) -> f64 {
    value * sample_rate / TWO_PI
}

/// Converts Hz to radians per sample.
pub fn hz_to_rad_per_sample(hz: f64, sample_rate: f64) -> f64 {
    hz * TWO_PI / sample_rate
}
