//! Ultrasonic-carrier embedding.
//!
//! The band-limited voice is amplitude-modulated (double sideband,
//! suppressed carrier) onto a cosine tone near the top of the audible range
//! and summed into the carrier. The carrier is lowpassed first so the tone's
//! band holds nothing else. Decode mixes the input back down with the same
//! tone in phase and in quadrature. The embedded voice lands entirely in the
//! in-phase branch, while any other content near the tone (harmonics of a
//! bright carrier, say) spreads evenly over both, so the gate looks at the
//! ratio of the two energies as well as their sum.

use tracing::debug;

use super::{check_lengths, detection_window, EmbeddingStrategy, StrategyKind};
use crate::analysis::interior;
use crate::analytic::angular_frequency;
use crate::buffer::SampleBuffer;
use crate::config::UltrasonicConfig;
use crate::convolve::convolve;
use crate::error::{CodecError, CodecResult};
use crate::filter::FirKernel;
use crate::normalize::{clip_guard, normalize_peak, remove_dc};

/// Mean demodulated energy in each branch over the detection window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ToneEnergy {
    /// Mean I².
    pub in_phase: f64,
    /// Mean Q².
    pub quadrature: f64,
}

impl ToneEnergy {
    /// Mean I²+Q².
    pub fn total(&self) -> f64 {
        self.in_phase + self.quadrature
    }

    /// In-phase energy over quadrature energy.
    ///
    /// Infinite when the quadrature branch is exactly empty and the
    /// in-phase one is not; zero when both are empty.
    pub fn in_phase_ratio(&self) -> f64 {
        if self.quadrature > 0.0 {
            self.in_phase / self.quadrature
        } else if self.in_phase > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }
}

/// Voice on a suppressed-carrier AM tone.
#[derive(Debug, Clone)]
pub struct UltrasonicCarrier {
    config: UltrasonicConfig,
    sample_rate: u32,
    tone: f64,
    voice_band: FirKernel,
    carrier_guard: FirKernel,
}

impl UltrasonicCarrier {
    /// Creates the strategy.
    ///
    /// Fails if the tone plus the voice band does not fit below Nyquist, or
    /// if the carrier guard reaches into the tone's lower sideband.
    pub fn new(config: &UltrasonicConfig, sample_rate: u32) -> CodecResult<Self> {
        let rate = sample_rate as f64;
        let nyquist = rate / 2.0;
        if config.tone_hz + config.voice_cutoff_hz >= nyquist {
            return Err(CodecError::invalid_param(
                "ultrasonic.tone_hz",
                format!(
                    "tone {} Hz plus voice band {} Hz must stay below Nyquist ({} Hz)",
                    config.tone_hz, config.voice_cutoff_hz, nyquist
                ),
            ));
        }
        let lower_sideband = config.tone_hz - config.voice_cutoff_hz;
        if !(config.carrier_cutoff_hz > 0.0 && config.carrier_cutoff_hz < lower_sideband) {
            return Err(CodecError::invalid_param(
                "ultrasonic.carrier_cutoff_hz",
                format!(
                    "carrier guard {} Hz must lie in (0, {}) Hz",
                    config.carrier_cutoff_hz, lower_sideband
                ),
            ));
        }

        Ok(Self {
            config: config.clone(),
            sample_rate,
            tone: angular_frequency(config.tone_hz, rate),
            voice_band: FirKernel::sinc_lowpass(
                config.voice_cutoff_hz,
                config.filter_length,
                rate,
            )?,
            carrier_guard: FirKernel::sinc_lowpass(
                config.carrier_cutoff_hz,
                config.filter_length,
                rate,
            )?,
        })
    }

    /// Coherent demodulation: lowpassed in-phase and quadrature mixes.
    fn demodulate(&self, signal: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let (cos_mix, sin_mix): (Vec<f64>, Vec<f64>) = signal
            .iter()
            .enumerate()
            .map(|(n, &x)| {
                let (sin, cos) = (self.tone * n as f64).sin_cos();
                (2.0 * x * cos, 2.0 * x * sin)
            })
            .unzip();
        (
            convolve(&cos_mix, &self.voice_band),
            convolve(&sin_mix, &self.voice_band),
        )
    }

    /// Branch energies of the demodulated tone over the detection window.
    ///
    /// One kernel length is dropped at each end of the window, where the
    /// truncated lowpass leaks the audible carrier into the measurement.
    pub fn tone_energy(&self, input: &SampleBuffer) -> ToneEnergy {
        let window = detection_window(
            input.primary(),
            self.config.detection_seconds,
            self.sample_rate,
        );
        if window.is_empty() {
            return ToneEnergy::default();
        }
        let (i, q) = self.demodulate(window);
        let span = interior(i.len(), self.voice_band.len());
        let count = span.len().max(1) as f64;
        ToneEnergy {
            in_phase: i[span.clone()].iter().map(|v| v * v).sum::<f64>() / count,
            quadrature: q[span].iter().map(|v| v * v).sum::<f64>() / count,
        }
    }
}

impl EmbeddingStrategy for UltrasonicCarrier {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Ultrasonic
    }

    fn embed(&self, carrier: &[f64], voice: &[f64]) -> CodecResult<SampleBuffer> {
        check_lengths(carrier, voice)?;

        let mut band = convolve(voice, &self.voice_band);
        normalize_peak(&mut band, 1.0);
        let guarded = convolve(carrier, &self.carrier_guard);

        let mut output: Vec<f64> = guarded
            .iter()
            .zip(&band)
            .enumerate()
            .map(|(n, (&c, &v))| c + self.config.amplitude * v * (self.tone * n as f64).cos())
            .collect();
        clip_guard(&mut output);

        Ok(SampleBuffer::mono(output, self.sample_rate))
    }

    fn try_decode(&self, input: &SampleBuffer) -> Option<Vec<f64>> {
        let energy = self.tone_energy(input);
        let ratio = energy.in_phase_ratio();
        let present =
            energy.total() > self.config.min_energy && ratio >= self.config.min_in_phase_ratio;
        debug!(
            energy = energy.total(),
            ratio,
            present,
            tone_hz = self.config.tone_hz,
            "ultrasonic gate"
        );
        if !present {
            return None;
        }

        let (mut voice, _) = self.demodulate(input.primary());
        remove_dc(&mut voice);
        Some(voice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::normalized_cross_correlation;
    use crate::oscillator::Waveshape;
    use crate::testsignal::linear_sweep;

    const RATE: u32 = 44100;

    fn strategy() -> UltrasonicCarrier {
        UltrasonicCarrier::new(&UltrasonicConfig::default(), RATE).unwrap()
    }

    fn tone(hz: f64, amplitude: f64, len: usize) -> Vec<f64> {
        let w = angular_frequency(hz, RATE as f64);
        (0..len).map(|n| amplitude * (w * n as f64).sin()).collect()
    }

    fn blended(hz: f64, len: usize) -> Vec<f64> {
        let shape = Waveshape::SineSawBlend { saw_mix: 0.5 };
        let w = angular_frequency(hz, RATE as f64);
        (0..len).map(|n| 0.9 * shape.sample(w * n as f64)).collect()
    }

    #[test]
    fn test_round_trip_on_silent_carrier() {
        let voice = tone(440.0, 0.7, 22050);
        let out = strategy().embed(&vec![0.0; 22050], &voice).unwrap();
        let recovered = strategy().try_decode(&out).unwrap();
        let corr = normalized_cross_correlation(&recovered[500..21500], &voice[500..21500]);
        assert!(corr > 0.99, "correlation {}", corr);
    }

    #[test]
    fn test_recovers_under_audible_carrier() {
        let voice = tone(300.0, 0.5, 22050);
        let carrier = tone(2500.0, 0.9, 22050);
        let out = strategy().embed(&carrier, &voice).unwrap();
        let recovered = strategy().try_decode(&out).unwrap();
        let corr = normalized_cross_correlation(&recovered[500..21500], &voice[500..21500]);
        assert!(corr > 0.95, "correlation {}", corr);
    }

    #[test]
    fn test_gate_rejects_plain_carrier() {
        let carrier = SampleBuffer::mono(tone(2500.0, 0.9, 44100), RATE);
        assert!(strategy().tone_energy(&carrier).total() < 1e-6);
        assert!(strategy().try_decode(&carrier).is_none());
    }

    #[test]
    fn test_gate_rejects_bright_carrier() {
        // A sawtooth blend puts real energy near the tone, split evenly
        // between the two branches.
        for hz in [440.0, 1000.0, 2500.0] {
            let carrier = SampleBuffer::mono(blended(hz, 44100), RATE);
            let energy = strategy().tone_energy(&carrier);
            assert!(energy.total() > 1e-4, "{} Hz energy {:?}", hz, energy);
            assert!(energy.in_phase_ratio() < 3.0, "{} Hz energy {:?}", hz, energy);
            assert!(strategy().try_decode(&carrier).is_none(), "{} Hz", hz);
        }
    }

    #[test]
    fn test_round_trip_under_bright_carrier() {
        let voice = linear_sweep(200.0, 800.0, 1.0, RATE, 0.8);
        let out = strategy().embed(&blended(1000.0, voice.len()), &voice).unwrap();

        let energy = strategy().tone_energy(&out);
        assert!(energy.in_phase_ratio() > 1e6, "energy {:?}", energy);

        let recovered = strategy().try_decode(&out).unwrap();
        let span = interior(voice.len(), 1000);
        let corr = normalized_cross_correlation(&recovered[span.clone()], &voice[span]);
        assert!(corr > 0.99, "correlation {}", corr);
    }

    #[test]
    fn test_energy_ratio_edges() {
        assert_eq!(ToneEnergy::default().in_phase_ratio(), 0.0);
        let pure = ToneEnergy {
            in_phase: 1e-3,
            quadrature: 0.0,
        };
        assert!(pure.in_phase_ratio().is_infinite());
    }

    #[test]
    fn test_embed_stays_below_unity() {
        let out = strategy()
            .embed(&tone(1000.0, 1.0, 4410), &tone(200.0, 1.0, 4410))
            .unwrap();
        assert!(crate::normalize::peak(out.primary()) <= 1.0);
    }

    #[test]
    fn test_rejects_tone_near_nyquist() {
        assert!(UltrasonicCarrier::new(&UltrasonicConfig::default(), 32000).is_err());
    }

    #[test]
    fn test_rejects_guard_inside_sideband() {
        let config = UltrasonicConfig {
            carrier_cutoff_hz: 16500.0,
            ..Default::default()
        };
        assert!(UltrasonicCarrier::new(&config, RATE).is_err());
    }
}
