//! Phase-accumulator resynthesis from frequency and amplitude contours.
//!
//! Per sample:
//!
//! ```text
//! phase += contour[i] · 2π / sample_rate · scale
//! out[i] = waveshape(phase · harmonic_multiplier) · envelope[i]
//! ```
//!
//! Contours are in radians per sample, as produced by [`crate::demod::fm`].
//! The effective pitch ratio between the analysed and the synthesised
//! fundamental is [`Synthesizer::pitch_ratio`]. Encoding uses a large
//! `scale` to lift speech into the chirp register; decoding uses
//! [`Synthesizer::inverse`].

use crate::error::{CodecError, CodecResult};
use crate::oscillator::{PhaseAccumulator, Waveshape, TWO_PI};

/// Contour-driven oscillator.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesizer {
    sample_rate: f64,
    scale: f64,
    harmonic_multiplier: f64,
    waveshape: Waveshape,
}

impl Synthesizer {
    /// Creates a synthesizer.
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz
    /// * `scale` - Frequency-scale factor applied to the contour
    /// * `harmonic_multiplier` - Multiplier applied to the phase before shaping
    /// * `waveshape` - Periodic waveshape
    pub fn new(
        sample_rate: f64,
        scale: f64,
        harmonic_multiplier: f64,
        waveshape: Waveshape,
    ) -> CodecResult<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(CodecError::invalid_param(
                "sample_rate",
                format!("must be positive, got {}", sample_rate),
            ));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(CodecError::invalid_param(
                "frequency_scale",
                format!("must be positive, got {}", scale),
            ));
        }
        if !(harmonic_multiplier.is_finite() && harmonic_multiplier > 0.0) {
            return Err(CodecError::invalid_param(
                "harmonic_multiplier",
                format!("must be positive, got {}", harmonic_multiplier),
            ));
        }
        Ok(Self {
            sample_rate,
            scale,
            harmonic_multiplier,
            waveshape,
        })
    }

    /// Ratio between the synthesised fundamental and the contour frequency.
    pub fn pitch_ratio(&self) -> f64 {
        TWO_PI / self.sample_rate * self.scale * self.harmonic_multiplier
    }

    /// The synthesizer that undoes this one's pitch ratio.
    ///
    /// It uses a pure sine and no harmonic multiplier, so feeding it the FM
    /// contour of this synthesizer's output yields the original contour.
    pub fn inverse(&self) -> Synthesizer {
        Synthesizer {
            sample_rate: self.sample_rate,
            scale: self.sample_rate / (TWO_PI * self.pitch_ratio()),
            harmonic_multiplier: 1.0,
            waveshape: Waveshape::Sine,
        }
    }

    /// Frequency-scale factor.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Waveshape in use.
    pub fn waveshape(&self) -> Waveshape {
        self.waveshape
    }

    /// Phase increment for one contour value.
    #[inline]
    pub fn phase_increment(&self, contour: f64) -> f64 {
        contour * TWO_PI / self.sample_rate * self.scale
    }

    /// Renders one sample, advancing `phase`.
    #[inline]
    pub fn render_sample(&self, phase: &mut PhaseAccumulator, contour: f64, envelope: f64) -> f64 {
        let theta = phase.advance(self.phase_increment(contour));
        self.waveshape.sample(theta * self.harmonic_multiplier) * envelope
    }

    /// Renders a whole buffer from equal-length contours.
    pub fn synthesize(&self, contour: &[f64], envelope: &[f64]) -> CodecResult<Vec<f64>> {
        if contour.len() != envelope.len() {
            return Err(CodecError::LengthMismatch {
                what: "envelope",
                expected: contour.len(),
                actual: envelope.len(),
            });
        }

        let mut phase = PhaseAccumulator::new();
        Ok(contour
            .iter()
            .zip(envelope)
            .map(|(&c, &e)| self.render_sample(&mut phase, c, e))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytic::analytic;
    use crate::demod::{self, hz_to_rad_per_sample};
    use crate::filter::FirKernel;

    const RATE: f64 = 44100.0;

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    #[test]
    fn test_pitch_ratio() {
        let synth = Synthesizer::new(RATE, 30000.0, 1.0, Waveshape::Sine).unwrap();
        assert!((synth.pitch_ratio() - TWO_PI * 30000.0 / RATE).abs() < 1e-12);

        let doubled = Synthesizer::new(RATE, 30000.0, 2.0, Waveshape::Sine).unwrap();
        assert!((doubled.pitch_ratio() - 2.0 * synth.pitch_ratio()).abs() < 1e-12);
    }

    #[test]
    fn test_inverse_ratio_is_reciprocal() {
        let synth = Synthesizer::new(RATE, 30000.0, 1.5, Waveshape::default()).unwrap();
        let inverse = synth.inverse();
        assert!((synth.pitch_ratio() * inverse.pitch_ratio() - 1.0).abs() < 1e-12);
        assert_eq!(inverse.waveshape(), Waveshape::Sine);
    }

    #[test]
    fn test_demodulating_output_recovers_contours() {
        let synth = Synthesizer::new(RATE, 30000.0, 1.0, Waveshape::Sine).unwrap();
        let voice = hz_to_rad_per_sample(600.0, RATE);
        let contour = vec![voice; 8820];
        let envelope = vec![0.5; 8820];
        let out = synth.synthesize(&contour, &envelope).unwrap();

        let iq = analytic(&out, &FirKernel::hilbert(255).unwrap());
        let freq = demod::fm(&iq);
        let amp = demod::am(&iq);

        let interior = 500..8320;
        let expected = voice * synth.pitch_ratio();
        let measured = mean(&freq[interior.clone()]);
        assert!((measured - expected).abs() / expected < 0.01);
        assert!((mean(&amp[interior]) - 0.5).abs() < 0.01);

        // Scaling back down lands on the original contour.
        assert!((measured / synth.pitch_ratio() - voice).abs() / voice < 0.01);
    }

    #[test]
    fn test_harmonic_multiplier_raises_fundamental() {
        let synth = Synthesizer::new(RATE, 10000.0, 3.0, Waveshape::Sine).unwrap();
        let voice = hz_to_rad_per_sample(200.0, RATE);
        let out = synth.synthesize(&vec![voice; 8820], &vec![1.0; 8820]).unwrap();
        let iq = analytic(&out, &FirKernel::hilbert(255).unwrap());
        let measured = mean(&demod::fm(&iq)[500..8320]);
        let expected = voice * synth.pitch_ratio();
        assert!((measured - expected).abs() / expected < 0.01);
    }

    #[test]
    fn test_envelope_scales_output() {
        let synth = Synthesizer::new(RATE, 30000.0, 1.0, Waveshape::Sine).unwrap();
        let out = synth.synthesize(&[0.05; 100], &[0.0; 100]).unwrap();
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_length_mismatch() {
        let synth = Synthesizer::new(RATE, 30000.0, 1.0, Waveshape::Sine).unwrap();
        assert!(matches!(
            synth.synthesize(&[0.1; 3], &[1.0; 2]),
            Err(CodecError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(Synthesizer::new(0.0, 1.0, 1.0, Waveshape::Sine).is_err());
        assert!(Synthesizer::new(RATE, -1.0, 1.0, Waveshape::Sine).is_err());
        assert!(Synthesizer::new(RATE, 1.0, 0.0, Waveshape::Sine).is_err());
        assert!(Synthesizer::new(RATE, f64::NAN, 1.0, Waveshape::Sine).is_err());
    }

    #[test]
    fn test_empty_contour() {
        let synth = Synthesizer::new(RATE, 30000.0, 1.0, Waveshape::Sine).unwrap();
        assert!(synth.synthesize(&[], &[]).unwrap().is_empty());
    }
}
