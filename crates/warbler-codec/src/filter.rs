//! FIR kernel design.
//!
//! Two kernel families are used by the codec:
//!
//! - a Hamming-windowed Hilbert kernel (broadband 90° phase shifter), and
//! - Blackman-windowed sinc lowpass kernels normalised to unity DC gain.
//!
//! Kernels are odd-length and centre-aligned: tap `i` sits at offset
//! `n = i - len / 2` from the centre, so convolving with [`crate::convolve`]
//! keeps output sample `i` aligned with input sample `i`. Kernels are pure
//! functions of their parameters and can be built once and shared.

use std::f64::consts::PI;

use crate::error::{CodecError, CodecResult};

/// An odd-length, centre-aligned FIR kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct FirKernel {
    taps: Vec<f64>,
}

impl FirKernel {
    /// Wraps precomputed taps after checking the length invariant.
    pub fn from_taps(taps: Vec<f64>) -> CodecResult<Self> {
        check_length(taps.len())?;
        Ok(Self { taps })
    }

    /// Designs a Hilbert transformer.
    ///
    /// Taps at even offsets from the centre (including the centre) are
    /// exactly zero; odd offsets get `2 / (π·n)`, all weighted by a Hamming
    /// window.
    ///
    /// # Arguments
    /// * `length` - Odd kernel length, at least 3
    pub fn hilbert(length: usize) -> CodecResult<Self> {
        check_length(length)?;

        let mid = (length / 2) as i64;
        let span = (length - 1) as f64;
        let taps = (0..length)
            .map(|i| {
                let n = i as i64 - mid;
                if n % 2 == 0 {
                    return 0.0;
                }
                let window = 0.54 - 0.46 * (2.0 * PI * i as f64 / span).cos();
                2.0 / (PI * n as f64) * window
            })
            .collect();

        Ok(Self { taps })
    }

    /// Designs a windowed-sinc lowpass with unity DC gain.
    ///
    /// # Arguments
    /// * `cutoff_hz` - Cutoff frequency in Hz, strictly inside (0, Nyquist)
    /// * `length` - Odd kernel length, at least 3
    /// * `sample_rate` - Sample rate in Hz
    pub fn sinc_lowpass(cutoff_hz: f64, length: usize, sample_rate: f64) -> CodecResult<Self> {
        check_length(length)?;
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(CodecError::invalid_param(
                "sample_rate",
                format!("must be positive, got {}", sample_rate),
            ));
        }
        let nyquist = sample_rate / 2.0;
        if !(cutoff_hz.is_finite() && cutoff_hz > 0.0 && cutoff_hz < nyquist) {
            return Err(CodecError::InvalidCutoff {
                cutoff: cutoff_hz,
                nyquist,
            });
        }

        let fc = cutoff_hz / sample_rate;
        let mid = (length / 2) as i64;
        let span = (length - 1) as f64;

        let mut taps: Vec<f64> = (0..length)
            .map(|i| {
                let n = (i as i64 - mid) as f64;
                let sinc = if n == 0.0 {
                    2.0 * PI * fc
                } else {
                    (2.0 * PI * fc * n).sin() / n
                };
                let phase = 2.0 * PI * i as f64 / span;
                let window = 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos();
                sinc * window
            })
            .collect();

        let sum: f64 = taps.iter().sum();
        for tap in taps.iter_mut() {
            *tap /= sum;
        }

        Ok(Self { taps })
    }

    /// Kernel taps.
    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    /// Number of taps (always odd).
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Always false; kernels have at least three taps.
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    /// Index of the centre tap, which is also the group delay in samples.
    pub fn mid(&self) -> usize {
        self.taps.len() / 2
    }
}

fn check_length(length: usize) -> CodecResult<()> {
    if length < 3 || length % 2 == 0 {
        return Err(CodecError::InvalidKernelLength { length });
    }
    Ok(())
}
