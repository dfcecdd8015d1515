//! Analytic (I/Q) signals and complex frequency shifting.
//!
//! The quadrature branch is the Hilbert kernel applied with the crate's
//! centred convolution, so a tone `cos(ωn)` becomes the pair
//! `(cos ωn, -sin ωn)`: the phasor turns clockwise. [`crate::demod::fm`]
//! measures rotation with the matching sign, which makes every tone report a
//! positive frequency. [`ShiftDirection`] is defined against that reported
//! frequency, not against the raw complex exponent.

use std::f64::consts::PI;

use crate::convolve::convolve;
use crate::error::{CodecError, CodecResult};
use crate::filter::FirKernel;

/// Two parallel buffers holding the in-phase and quadrature parts.
#[derive(Debug, Clone, PartialEq)]
pub struct IqBuffer {
    /// In-phase (real) part.
    pub i: Vec<f64>,
    /// Quadrature (imaginary) part.
    pub q: Vec<f64>,
}

impl IqBuffer {
    /// Pairs two equal-length buffers.
    pub fn new(i: Vec<f64>, q: Vec<f64>) -> CodecResult<Self> {
        if i.len() != q.len() {
            return Err(CodecError::LengthMismatch {
                what: "quadrature",
                expected: i.len(),
                actual: q.len(),
            });
        }
        Ok(Self { i, q })
    }

    /// Number of complex samples.
    pub fn len(&self) -> usize {
        self.i.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.i.is_empty()
    }
}

/// Builds the analytic representation of a real signal.
///
/// `I` is a copy of the input and `Q` is the input run through the Hilbert
/// kernel.
pub fn analytic(signal: &[f64], hilbert: &FirKernel) -> IqBuffer {
    IqBuffer {
        i: signal.to_vec(),
        q: convolve(signal, hilbert),
    }
}

/// Direction of a frequency translation, as seen by [`crate::demod::fm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftDirection {
    /// Lower every component by the shift frequency.
    Down,
    /// Raise every component by the shift frequency.
    Up,
}

/// Converts a frequency in Hz to radians per sample.
pub fn angular_frequency(hz: f64, sample_rate: f64) -> f64 {
    2.0 * PI * hz / sample_rate
}

/// Rotates one complex sample by `phase` radians in the given direction.
#[inline]
pub fn rotate(i: f64, q: f64, phase: f64, direction: ShiftDirection) -> (f64, f64) {
    let (sin, cos) = phase.sin_cos();
    match direction {
        // Multiply by e^{+jθ}.
        ShiftDirection::Down => (i * cos - q * sin, i * sin + q * cos),
        // Multiply by e^{-jθ}.
        ShiftDirection::Up => (i * cos + q * sin, -i * sin + q * cos),
    }
}

/// Translates an I/Q signal by `angular_freq` radians per sample.
///
/// The rotation phase for sample `n` is `angular_freq · n`.
pub fn shift(iq: &IqBuffer, angular_freq: f64, direction: ShiftDirection) -> IqBuffer {
    let (i, q) = iq
        .i
        .iter()
        .zip(&iq.q)
        .enumerate()
        .map(|(n, (&i, &q))| rotate(i, q, angular_freq * n as f64, direction))
        .unzip();
    IqBuffer { i, q }
}

/// Complex band filter: shift to baseband, lowpass, shift back.
///
/// The passband is `[shift - cutoff, shift + cutoff]` on the positive side.
/// Because the negative-frequency image left by a finite Hilbert kernel lands
/// at least `shift` Hz below zero after the down-shift, it falls outside the
/// lowpass and is removed too.
#[derive(Debug, Clone)]
pub struct BasebandFilter {
    shift: f64,
    lowpass: FirKernel,
}

impl BasebandFilter {
    /// Designs the filter.
    ///
    /// # Arguments
    /// * `shift_hz` - Centre of the passband in Hz
    /// * `cutoff_hz` - Half-width of the passband in Hz
    /// * `length` - Lowpass kernel length
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(shift_hz: f64, cutoff_hz: f64, length: usize, sample_rate: f64) -> CodecResult<Self> {
        if !(shift_hz.is_finite() && shift_hz > 0.0) {
            return Err(CodecError::invalid_param(
                "baseband_shift_hz",
                format!("must be positive, got {}", shift_hz),
            ));
        }
        Ok(Self {
            shift: angular_frequency(shift_hz, sample_rate),
            lowpass: FirKernel::sinc_lowpass(cutoff_hz, length, sample_rate)?,
        })
    }

    /// Shift in radians per sample.
    pub fn shift(&self) -> f64 {
        self.shift
    }

    /// The baseband lowpass kernel.
    pub fn lowpass(&self) -> &FirKernel {
        &self.lowpass
    }

    /// Filters a whole buffer.
    pub fn apply(&self, iq: &IqBuffer) -> IqBuffer {
        let base = shift(iq, self.shift, ShiftDirection::Down);
        let filtered = IqBuffer {
            i: convolve(&base.i, &self.lowpass),
            q: convolve(&base.q, &self.lowpass),
        };
        shift(&filtered, self.shift, ShiftDirection::Up)
    }
}
