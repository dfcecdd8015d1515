//! Whole-buffer encode and decode pipelines.
//!
//! ```text
//! encode: voice -> analytic -> band filter -> FM/AM -> synthesizer
//!               -> peak normalize -> strategy.embed(carrier, voice)
//!
//! decode: input -> secondary? -> ultrasonic? -> phase? -> DSP inversion
//!               -> peak normalize
//! ```
//!
//! Both pipelines build their kernels once in `new` and are immutable
//! afterwards, so one instance may serve any number of threads.

use tracing::{debug, info, warn};

use crate::analytic::{analytic, BasebandFilter};
use crate::buffer::SampleBuffer;
use crate::config::CodecConfig;
use crate::demod::{am, fm};
use crate::embed::{build_strategy, detection_order, DspInversion, EmbeddingStrategy, StrategyKind};
use crate::error::{CodecError, CodecResult};
use crate::filter::FirKernel;
use crate::normalize::normalize_peak;
use crate::synthesis::Synthesizer;

/// Result of an encode.
#[derive(Debug, Clone)]
pub struct EncodeOutput {
    /// Encoded audio: mono, or stereo for the secondary-channel strategy.
    pub buffer: SampleBuffer,
    /// Strategy that produced it.
    pub strategy: StrategyKind,
    /// Ratio between carrier and voice fundamentals.
    pub pitch_ratio: f64,
}

/// Result of a decode.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// A voice was recovered.
    Recovered {
        /// Strategy whose gate passed, or `None` for the DSP inversion.
        strategy: StrategyKind,
        /// Recovered mono voice, peak-normalized.
        voice: SampleBuffer,
    },
    /// No gate passed and the inversion produced near-silence.
    NoRecoverableVoice {
        /// Strategies that were tried, in order.
        attempted: Vec<StrategyKind>,
    },
}

impl DecodeOutcome {
    /// The recovered voice, if any.
    pub fn voice(&self) -> Option<&SampleBuffer> {
        match self {
            DecodeOutcome::Recovered { voice, .. } => Some(voice),
            DecodeOutcome::NoRecoverableVoice { .. } => None,
        }
    }

    /// The strategy that produced the voice, if any.
    pub fn strategy(&self) -> Option<StrategyKind> {
        match self {
            DecodeOutcome::Recovered { strategy, .. } => Some(*strategy),
            DecodeOutcome::NoRecoverableVoice { .. } => None,
        }
    }

    /// Returns true if a voice was recovered.
    pub fn is_recovered(&self) -> bool {
        matches!(self, DecodeOutcome::Recovered { .. })
    }
}

fn check_rate(config: &CodecConfig, buffer: &SampleBuffer) -> CodecResult<()> {
    if buffer.sample_rate() != config.sample_rate {
        return Err(CodecError::invalid_param(
            "sample_rate",
            format!(
                "buffer is {} Hz but the codec was built for {} Hz",
                buffer.sample_rate(),
                config.sample_rate
            ),
        ));
    }
    Ok(())
}

/// Voice-to-birdsong encoder.
#[derive(Debug)]
pub struct Encoder {
    config: CodecConfig,
    hilbert: FirKernel,
    baseband: BasebandFilter,
    synthesizer: Synthesizer,
    strategy: Box<dyn EmbeddingStrategy>,
}

impl Encoder {
    /// Validates the configuration and designs every kernel.
    pub fn new(config: CodecConfig) -> CodecResult<Self> {
        config.validate()?;
        let rate = config.sample_rate as f64;

        Ok(Self {
            hilbert: FirKernel::hilbert(config.hilbert_length)?,
            baseband: BasebandFilter::new(
                config.baseband.shift_hz,
                config.baseband.cutoff_hz,
                config.baseband.length,
                rate,
            )?,
            synthesizer: Synthesizer::new(
                rate,
                config.frequency_scale,
                config.harmonic_multiplier,
                config.waveshape,
            )?,
            strategy: build_strategy(config.strategy, &config)?,
            config,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Ratio between carrier and voice fundamentals.
    pub fn pitch_ratio(&self) -> f64 {
        self.synthesizer.pitch_ratio()
    }

    /// Frequency and amplitude contours of a voice signal.
    pub fn contours(&self, voice: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let band = self.baseband.apply(&analytic(voice, &self.hilbert));
        (fm(&band), am(&band))
    }

    /// Synthesized carrier, normalized to the configured peak.
    pub fn carrier(&self, voice: &[f64]) -> CodecResult<Vec<f64>> {
        let (freq, envelope) = self.contours(voice);
        let mut carrier = self.synthesizer.synthesize(&freq, &envelope)?;
        normalize_peak(&mut carrier, self.config.output_peak);
        Ok(carrier)
    }

    /// Encodes a voice buffer. Stereo input is reduced to its first channel.
    pub fn encode(&self, input: &SampleBuffer) -> CodecResult<EncodeOutput> {
        check_rate(&self.config, input)?;
        let strategy = self.strategy.kind();

        if input.is_empty() {
            return Ok(EncodeOutput {
                buffer: SampleBuffer::empty(input.channel_count(), input.sample_rate())?,
                strategy,
                pitch_ratio: self.pitch_ratio(),
            });
        }

        let voice = input.primary();
        let carrier = self.carrier(voice)?;
        let buffer = self.strategy.embed(&carrier, voice)?;
        info!(
            samples = voice.len(),
            strategy = strategy.name(),
            channels = buffer.channel_count(),
            "encoded"
        );

        Ok(EncodeOutput {
            buffer,
            strategy,
            pitch_ratio: self.pitch_ratio(),
        })
    }
}

/// Birdsong-to-voice decoder with strategy auto-detection.
#[derive(Debug)]
pub struct Decoder {
    config: CodecConfig,
    detectors: Vec<Box<dyn EmbeddingStrategy>>,
    fallback: DspInversion,
}

impl Decoder {
    /// Validates the configuration and builds every detector.
    ///
    /// The ultrasonic detector is left out when its tone does not fit below
    /// Nyquist at the configured sample rate.
    pub fn new(config: CodecConfig) -> CodecResult<Self> {
        config.validate()?;

        let mut detectors = Vec::with_capacity(3);
        for kind in detection_order() {
            if kind == StrategyKind::Ultrasonic && !config.ultrasonic_fits() {
                debug!(
                    sample_rate = config.sample_rate,
                    "ultrasonic detector disabled at this sample rate"
                );
                continue;
            }
            detectors.push(build_strategy(kind, &config)?);
        }

        Ok(Self {
            fallback: DspInversion::new(&config)?,
            detectors,
            config,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Strategies tried before the fallback, in order.
    pub fn detectors(&self) -> Vec<StrategyKind> {
        self.detectors.iter().map(|d| d.kind()).collect()
    }

    /// The first side channel whose gate passes, without decoding further.
    pub fn detect(&self, input: &SampleBuffer) -> CodecResult<Option<StrategyKind>> {
        check_rate(&self.config, input)?;
        if input.is_empty() {
            return Ok(None);
        }
        Ok(self
            .detectors
            .iter()
            .find(|d| d.try_decode(input).is_some())
            .map(|d| d.kind()))
    }

    /// Decodes with auto-detection.
    ///
    /// Side channels are tried in [`detection_order`]; the DSP inversion
    /// runs only if every gate fails.
    pub fn decode(&self, input: &SampleBuffer) -> CodecResult<DecodeOutcome> {
        check_rate(&self.config, input)?;
        if input.is_empty() {
            return self.empty_outcome(input);
        }

        let mut attempted = Vec::with_capacity(self.detectors.len() + 1);
        for detector in &self.detectors {
            attempted.push(detector.kind());
            if let Some(voice) = detector.try_decode(input) {
                return Ok(self.recovered(detector.kind(), voice, input));
            }
        }

        attempted.push(StrategyKind::None);
        Ok(self.run_fallback(input, attempted))
    }

    /// Decodes with one strategy only, skipping detection.
    pub fn decode_with(&self, kind: StrategyKind, input: &SampleBuffer) -> CodecResult<DecodeOutcome> {
        check_rate(&self.config, input)?;
        if input.is_empty() {
            return self.empty_outcome(input);
        }

        if kind == StrategyKind::None {
            return Ok(self.run_fallback(input, vec![StrategyKind::None]));
        }

        let strategy = build_strategy(kind, &self.config)?;
        Ok(match strategy.try_decode(input) {
            Some(voice) => self.recovered(kind, voice, input),
            None => {
                warn!(strategy = kind.name(), "forced strategy found no voice");
                DecodeOutcome::NoRecoverableVoice {
                    attempted: vec![kind],
                }
            }
        })
    }

    fn empty_outcome(&self, input: &SampleBuffer) -> CodecResult<DecodeOutcome> {
        Ok(DecodeOutcome::Recovered {
            strategy: StrategyKind::None,
            voice: SampleBuffer::empty(input.channel_count(), input.sample_rate())?,
        })
    }

    fn run_fallback(&self, input: &SampleBuffer, attempted: Vec<StrategyKind>) -> DecodeOutcome {
        match self.fallback.try_decode(input) {
            Some(voice) => self.recovered(StrategyKind::None, voice, input),
            None => {
                warn!(?attempted, "no recoverable voice");
                DecodeOutcome::NoRecoverableVoice { attempted }
            }
        }
    }

    fn recovered(&self, strategy: StrategyKind, mut voice: Vec<f64>, input: &SampleBuffer) -> DecodeOutcome {
        normalize_peak(&mut voice, self.config.output_peak);
        debug!(strategy = strategy.name(), "voice recovered");
        DecodeOutcome::Recovered {
            strategy,
            voice: SampleBuffer::mono(voice, input.sample_rate()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::normalized_cross_correlation;
    use crate::normalize::peak;
    use crate::testsignal::linear_sweep;
    use pretty_assertions::assert_eq;

    const RATE: u32 = 44100;

    #[test]
    fn test_empty_input_keeps_shape() {
        let encoder = Encoder::new(CodecConfig::default()).unwrap();
        let stereo = SampleBuffer::empty(2, RATE).unwrap();
        let out = encoder.encode(&stereo).unwrap();
        assert_eq!(out.buffer.channel_count(), 2);
        assert!(out.buffer.is_empty());

        let decoder = Decoder::new(CodecConfig::default()).unwrap();
        let outcome = decoder.decode(&SampleBuffer::mono(vec![], RATE)).unwrap();
        assert!(outcome.is_recovered());
        assert!(outcome.voice().unwrap().is_empty());
    }

    #[test]
    fn test_rate_mismatch_is_rejected() {
        let encoder = Encoder::new(CodecConfig::default()).unwrap();
        let err = encoder
            .encode(&SampleBuffer::mono(vec![0.0; 10], 48000))
            .unwrap_err();
        assert_eq!(err.code(), "CODEC_004");
    }

    #[test]
    fn test_invalid_config_fails_at_construction() {
        let mut config = CodecConfig::default();
        config.baseband.length = 1024;
        assert!(Encoder::new(config.clone()).is_err());
        assert!(Decoder::new(config).is_err());
    }

    #[test]
    fn test_carrier_peak() {
        let encoder = Encoder::new(CodecConfig::default()).unwrap();
        let voice = linear_sweep(200.0, 800.0, 0.3, RATE, 0.5);
        let carrier = encoder.carrier(&voice).unwrap();
        assert_eq!(carrier.len(), voice.len());
        assert!((peak(&carrier) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_secondary_round_trip() {
        let encoder = Encoder::new(CodecConfig::default()).unwrap();
        let decoder = Decoder::new(CodecConfig::default()).unwrap();
        let voice = linear_sweep(200.0, 800.0, 0.5, RATE, 0.7);

        let encoded = encoder.encode(&SampleBuffer::mono(voice.clone(), RATE)).unwrap();
        assert_eq!(encoded.strategy, StrategyKind::SecondaryChannel);
        assert!(encoded.buffer.is_stereo());

        let outcome = decoder.decode(&encoded.buffer).unwrap();
        assert_eq!(outcome.strategy(), Some(StrategyKind::SecondaryChannel));
        let recovered = outcome.voice().unwrap();
        assert!((peak(recovered.primary()) - 0.9).abs() < 1e-12);
        assert!(normalized_cross_correlation(recovered.primary(), &voice) > 0.999);
    }

    #[test]
    fn test_silence_is_not_recoverable() {
        let decoder = Decoder::new(CodecConfig::default()).unwrap();
        let outcome = decoder.decode(&SampleBuffer::mono(vec![0.0; 8820], RATE)).unwrap();
        assert_eq!(
            outcome,
            DecodeOutcome::NoRecoverableVoice {
                attempted: vec![
                    StrategyKind::SecondaryChannel,
                    StrategyKind::Ultrasonic,
                    StrategyKind::PhaseChannel,
                    StrategyKind::None,
                ],
            }
        );
    }

    #[test]
    fn test_low_rate_drops_ultrasonic_detector() {
        let decoder = Decoder::new(CodecConfig::default().with_sample_rate(16000)).unwrap();
        assert_eq!(
            decoder.detectors(),
            vec![StrategyKind::SecondaryChannel, StrategyKind::PhaseChannel]
        );
    }

    #[test]
    fn test_decode_with_forced_strategy() {
        let decoder = Decoder::new(CodecConfig::default()).unwrap();
        let mono = SampleBuffer::mono(vec![0.1; 4410], RATE);
        let outcome = decoder
            .decode_with(StrategyKind::SecondaryChannel, &mono)
            .unwrap();
        assert_eq!(
            outcome,
            DecodeOutcome::NoRecoverableVoice {
                attempted: vec![StrategyKind::SecondaryChannel],
            }
        );
    }
}
