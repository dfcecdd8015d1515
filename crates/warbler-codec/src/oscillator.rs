//! Waveshapes and the phase accumulator behind the synthesizer.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// 2π.
pub const TWO_PI: f64 = 2.0 * PI;

/// Periodic waveshape applied to the accumulated phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Waveshape {
    /// Pure sine.
    Sine,
    /// Sine with attenuated 2nd and 3rd harmonics, rescaled to unit peak.
    SineHarmonics {
        /// Relative level of the 2nd harmonic.
        second: f64,
        /// Relative level of the 3rd harmonic.
        third: f64,
    },
    /// Crossfade between sine and a naive sawtooth.
    SineSawBlend {
        /// Sawtooth share, 0.0 (pure sine) to 1.0 (pure saw).
        saw_mix: f64,
    },
}

impl Default for Waveshape {
    fn default() -> Self {
        Waveshape::SineHarmonics {
            second: 0.12,
            third: 0.06,
        }
    }
}

impl Waveshape {
    /// Evaluates the waveshape at an unbounded phase in radians.
    ///
    /// The phase is reduced into [0, 2π) here and nowhere earlier.
    #[inline]
    pub fn sample(&self, phase: f64) -> f64 {
        let theta = phase.rem_euclid(TWO_PI);
        match *self {
            Waveshape::Sine => theta.sin(),
            Waveshape::SineHarmonics { second, third } => {
                let norm = 1.0 + second.abs() + third.abs();
                (theta.sin() + second * (2.0 * theta).sin() + third * (3.0 * theta).sin()) / norm
            }
            Waveshape::SineSawBlend { saw_mix } => {
                let mix = saw_mix.clamp(0.0, 1.0);
                (1.0 - mix) * theta.sin() + mix * sawtooth(theta)
            }
        }
    }

    /// Short name for reports.
    pub fn name(&self) -> &'static str {
        match self {
            Waveshape::Sine => "sine",
            Waveshape::SineHarmonics { .. } => "sine_harmonics",
            Waveshape::SineSawBlend { .. } => "sine_saw_blend",
        }
    }
}

/// Naive sawtooth: `(θ mod 2π) / π - 1`, rising from -1 to 1.
#[inline]
pub fn sawtooth(phase: f64) -> f64 {
    phase.rem_euclid(TWO_PI) / PI - 1.0
}

/// Integrates per-sample phase increments.
///
/// The running phase is never wrapped, so its first difference is always
/// exactly the increment that was added.
#[derive(Debug, Clone, Default)]
pub struct PhaseAccumulator {
    phase: f64,
}

impl PhaseAccumulator {
    /// Creates an accumulator starting at phase 0.
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Adds an increment in radians and returns the new phase.
    #[inline]
    pub fn advance(&mut self, increment: f64) -> f64 {
        self.phase += increment;
        self.phase
    }

    /// Current phase in radians.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Resets to phase 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
