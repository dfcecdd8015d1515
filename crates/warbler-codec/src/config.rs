//! Codec configuration.
//!
//! Every field has a default, so a JSON file only needs to name the values
//! it overrides:
//!
//! ```json
//! { "strategy": "ultrasonic", "frequency_scale": 25000.0 }
//! ```

use serde::{Deserialize, Serialize};

use crate::embed::StrategyKind;
use crate::error::{CodecError, CodecResult};
use crate::oscillator::Waveshape;

/// Reference sample rate.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Lowest accepted sample rate.
pub const MIN_SAMPLE_RATE: u32 = 8000;

/// Highest accepted sample rate.
pub const MAX_SAMPLE_RATE: u32 = 192_000;

/// Complete codec configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Sample rate the kernels are designed for, in Hz.
    pub sample_rate: u32,
    /// Hilbert kernel length (odd).
    pub hilbert_length: usize,
    /// Frequency-scale factor applied by the encode synthesizer.
    pub frequency_scale: f64,
    /// Phase multiplier applied before the waveshape.
    pub harmonic_multiplier: f64,
    /// Carrier waveshape.
    pub waveshape: Waveshape,
    /// Peak level of the encoded carrier and of decoded voice.
    pub output_peak: f64,
    /// Encode front-end band filter.
    pub baseband: BasebandConfig,
    /// Strategy used by encode.
    pub strategy: StrategyKind,
    /// Secondary-channel parameters.
    pub secondary: SecondaryConfig,
    /// Ultrasonic-carrier parameters.
    pub ultrasonic: UltrasonicConfig,
    /// Phase-channel parameters.
    pub phase: PhaseConfig,
    /// DSP inversion parameters.
    pub inversion: InversionConfig,
    /// Largest block accepted by the streaming encoder.
    pub block_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            hilbert_length: 255,
            frequency_scale: 30000.0,
            harmonic_multiplier: 1.0,
            waveshape: Waveshape::default(),
            output_peak: 0.9,
            baseband: BasebandConfig::default(),
            strategy: StrategyKind::default(),
            secondary: SecondaryConfig::default(),
            ultrasonic: UltrasonicConfig::default(),
            phase: PhaseConfig::default(),
            inversion: InversionConfig::default(),
            block_size: 512,
        }
    }
}

/// Band filter that isolates the voice fundamental before demodulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasebandConfig {
    /// Centre of the passband in Hz.
    pub shift_hz: f64,
    /// Half-width of the passband in Hz.
    pub cutoff_hz: f64,
    /// Lowpass kernel length.
    pub length: usize,
}

impl Default for BasebandConfig {
    fn default() -> Self {
        Self {
            shift_hz: 500.0,
            cutoff_hz: 450.0,
            length: 1023,
        }
    }
}

/// Secondary-channel embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryConfig {
    /// Gain applied to the voice on channel 2 (0.001 is -60 dB).
    pub hidden_gain: f64,
    /// Length of the detection window in seconds.
    pub detection_seconds: f64,
    /// Mean-square energy must exceed this to count as present.
    pub min_energy: f64,
    /// Mean-square energy above this is an audible channel, not a hidden one.
    pub max_energy: f64,
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            hidden_gain: 0.001,
            detection_seconds: 1.0,
            min_energy: 1e-12,
            max_energy: 1e-4,
        }
    }
}

/// Ultrasonic-carrier embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UltrasonicConfig {
    /// Tone frequency in Hz.
    pub tone_hz: f64,
    /// Peak amplitude of the modulated tone.
    pub amplitude: f64,
    /// Voice band limit in Hz.
    pub voice_cutoff_hz: f64,
    /// Voice band kernel length.
    pub filter_length: usize,
    /// The carrier is lowpassed here before the tone is added, clearing the
    /// band the tone occupies. Must stay below `tone_hz - voice_cutoff_hz`.
    pub carrier_cutoff_hz: f64,
    /// Length of the detection window in seconds.
    pub detection_seconds: f64,
    /// Demodulated I²+Q² energy must exceed this to count as present.
    pub min_energy: f64,
    /// In-phase energy must exceed quadrature energy by this factor.
    pub min_in_phase_ratio: f64,
}

impl Default for UltrasonicConfig {
    fn default() -> Self {
        Self {
            tone_hz: 19000.0,
            amplitude: 0.05,
            voice_cutoff_hz: 3000.0,
            filter_length: 255,
            carrier_cutoff_hz: 15000.0,
            detection_seconds: 1.0,
            min_energy: 1e-6,
            min_in_phase_ratio: 10.0,
        }
    }
}

/// Phase-channel embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Radians of phase deviation per unit of peak-normalized voice.
    pub modulation_index: f64,
    /// Cutoff applied to the carrier's phase and magnitude before the voice
    /// is added, in Hz. Must be below `carrier_cutoff_hz`.
    pub smoothing_cutoff_hz: f64,
    /// Carrier smoothing kernel length.
    pub smoothing_length: usize,
    /// Cutoff of the carrier-phase estimate in Hz.
    pub carrier_cutoff_hz: f64,
    /// Carrier-phase estimate kernel length.
    pub carrier_length: usize,
    /// Frequency of the marker tremolo on the output envelope, in Hz.
    pub marker_hz: f64,
    /// Depth of the marker tremolo (fraction of the envelope).
    pub marker_depth: f64,
    /// Voice band limit in Hz.
    pub voice_cutoff_hz: f64,
    /// Voice band kernel length.
    pub voice_length: usize,
    /// Recovered RMS must exceed this to count as present.
    pub min_rms: f64,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            modulation_index: 1.0,
            smoothing_cutoff_hz: 5.0,
            smoothing_length: 4095,
            carrier_cutoff_hz: 60.0,
            carrier_length: 4095,
            marker_hz: 40.0,
            marker_depth: 0.15,
            voice_cutoff_hz: 3000.0,
            voice_length: 255,
            min_rms: 0.05,
        }
    }
}

/// Best-effort DSP inversion used when no side channel is found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InversionConfig {
    /// Median window applied to the frequency contour.
    pub median_window: usize,
    /// Contour smoothing cutoff in Hz.
    pub contour_cutoff_hz: f64,
    /// Contour smoothing kernel length.
    pub contour_length: usize,
    /// Output smoothing cutoff in Hz.
    pub voice_cutoff_hz: f64,
    /// Output smoothing kernel length.
    pub voice_length: usize,
    /// Reconstructions quieter than this peak count as silence.
    pub silence_threshold: f64,
}

impl Default for InversionConfig {
    fn default() -> Self {
        Self {
            median_window: 5,
            contour_cutoff_hz: 100.0,
            contour_length: 1023,
            voice_cutoff_hz: 3000.0,
            voice_length: 255,
            silence_threshold: 1e-4,
        }
    }
}

impl CodecConfig {
    /// Parses a (possibly partial) JSON configuration and validates it.
    pub fn from_json(json: &str) -> CodecResult<Self> {
        let config: CodecConfig = serde_json::from_str(json)
            .map_err(|e| CodecError::invalid_param("config", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> String {
        // A struct of plain numbers and enums always serializes.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Same configuration at a different sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Nyquist frequency in Hz.
    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }

    /// True when the ultrasonic tone and its voice band fit below Nyquist.
    ///
    /// Decoders leave the ultrasonic detector out when they do not.
    pub fn ultrasonic_fits(&self) -> bool {
        self.ultrasonic.tone_hz + self.ultrasonic.voice_cutoff_hz < self.nyquist()
    }

    /// True when the carrier guard band ends below the tone's lower
    /// sideband.
    pub fn ultrasonic_guard_fits(&self) -> bool {
        let ultrasonic = &self.ultrasonic;
        ultrasonic.carrier_cutoff_hz > 0.0
            && ultrasonic.carrier_cutoff_hz < ultrasonic.tone_hz - ultrasonic.voice_cutoff_hz
    }

    /// Checks every parameter. Kernel cutoffs are checked again, against
    /// the exact sample rate, when the kernels are built.
    pub fn validate(&self) -> CodecResult<()> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&self.sample_rate) {
            return Err(CodecError::InvalidSampleRate {
                rate: self.sample_rate,
            });
        }

        check_length(self.hilbert_length)?;
        check_length(self.baseband.length)?;
        check_length(self.ultrasonic.filter_length)?;
        check_length(self.phase.smoothing_length)?;
        check_length(self.phase.carrier_length)?;
        check_length(self.phase.voice_length)?;
        check_length(self.inversion.contour_length)?;
        check_length(self.inversion.voice_length)?;

        check_positive("frequency_scale", self.frequency_scale)?;
        check_positive("harmonic_multiplier", self.harmonic_multiplier)?;
        check_positive("baseband.shift_hz", self.baseband.shift_hz)?;
        check_positive("secondary.detection_seconds", self.secondary.detection_seconds)?;
        check_positive("ultrasonic.detection_seconds", self.ultrasonic.detection_seconds)?;
        check_positive("phase.modulation_index", self.phase.modulation_index)?;
        check_positive("phase.marker_hz", self.phase.marker_hz)?;
        check_positive("ultrasonic.min_in_phase_ratio", self.ultrasonic.min_in_phase_ratio)?;

        check_unit("output_peak", self.output_peak)?;
        check_unit("secondary.hidden_gain", self.secondary.hidden_gain)?;
        check_unit("ultrasonic.amplitude", self.ultrasonic.amplitude)?;
        check_unit("phase.marker_depth", self.phase.marker_depth)?;

        if self.secondary.min_energy < 0.0 || self.secondary.max_energy <= self.secondary.min_energy
        {
            return Err(CodecError::invalid_param(
                "secondary.max_energy",
                "energy gate must satisfy 0 <= min_energy < max_energy",
            ));
        }

        if self.phase.smoothing_cutoff_hz >= self.phase.carrier_cutoff_hz {
            return Err(CodecError::invalid_param(
                "phase.smoothing_cutoff_hz",
                "must be below phase.carrier_cutoff_hz",
            ));
        }

        let nyquist = self.nyquist();
        if self.baseband.shift_hz + self.baseband.cutoff_hz >= nyquist {
            return Err(CodecError::invalid_param(
                "baseband",
                format!(
                    "shift_hz + cutoff_hz must stay below Nyquist ({} Hz)",
                    nyquist
                ),
            ));
        }
        if self.strategy == StrategyKind::Ultrasonic && !self.ultrasonic_fits() {
            return Err(CodecError::invalid_param(
                "ultrasonic.tone_hz",
                format!(
                    "tone {} Hz plus voice band {} Hz must stay below Nyquist ({} Hz)",
                    self.ultrasonic.tone_hz, self.ultrasonic.voice_cutoff_hz, nyquist
                ),
            ));
        }
        // The detector is built whenever the tone fits, whatever the strategy.
        if self.ultrasonic_fits() && !self.ultrasonic_guard_fits() {
            return Err(CodecError::invalid_param(
                "ultrasonic.carrier_cutoff_hz",
                format!(
                    "carrier guard must lie in (0, {}) Hz, below the tone's lower sideband",
                    self.ultrasonic.tone_hz - self.ultrasonic.voice_cutoff_hz
                ),
            ));
        }

        if self.inversion.median_window == 0 {
            return Err(CodecError::invalid_param(
                "inversion.median_window",
                "must be at least 1",
            ));
        }
        if self.block_size == 0 {
            return Err(CodecError::invalid_param("block_size", "must be at least 1"));
        }

        Ok(())
    }
}

fn check_length(length: usize) -> CodecResult<()> {
    if length < 3 || length % 2 == 0 {
        return Err(CodecError::InvalidKernelLength { length });
    }
    Ok(())
}

fn check_positive(name: &str, value: f64) -> CodecResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(CodecError::invalid_param(
            name,
            format!("must be positive, got {}", value),
        ));
    }
    Ok(())
}

fn check_unit(name: &str, value: f64) -> CodecResult<()> {
    if !(value > 0.0 && value <= 1.0) {
        return Err(CodecError::invalid_param(
            name,
            format!("must be in (0, 1], got {}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_validate() {
        CodecConfig::default().validate().unwrap();
    }

    #[test]
    fn test_json_roundtrip() {
        let config = CodecConfig {
            strategy: StrategyKind::PhaseChannel,
            waveshape: Waveshape::SineSawBlend { saw_mix: 0.3 },
            ..Default::default()
        };
        let json = config.to_json_pretty();
        let back = CodecConfig::from_json(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CodecConfig::from_json(
            r#"{ "strategy": "ultrasonic", "ultrasonic": { "amplitude": 0.02 } }"#,
        )
        .unwrap();
        assert_eq!(config.strategy, StrategyKind::Ultrasonic);
        assert_eq!(config.ultrasonic.amplitude, 0.02);
        assert_eq!(config.ultrasonic.tone_hz, 19000.0);
        assert_eq!(config.frequency_scale, 30000.0);
    }

    #[test]
    fn test_malformed_json() {
        let err = CodecConfig::from_json("{ not json").unwrap_err();
        assert_eq!(err.code(), "CODEC_004");
    }

    #[test]
    fn test_rejects_sample_rate() {
        let config = CodecConfig::default().with_sample_rate(4000);
        assert!(matches!(
            config.validate(),
            Err(CodecError::InvalidSampleRate { rate: 4000 })
        ));
    }

    #[test]
    fn test_rejects_even_kernel() {
        let mut config = CodecConfig::default();
        config.hilbert_length = 256;
        assert!(matches!(
            config.validate(),
            Err(CodecError::InvalidKernelLength { length: 256 })
        ));
    }

    #[test]
    fn test_rejects_tone_above_nyquist() {
        // 19 kHz + 3 kHz does not fit under 16 kHz.
        let mut config = CodecConfig::default().with_sample_rate(32000);
        assert!(!config.ultrasonic_fits());
        config.validate().unwrap();
        config.strategy = StrategyKind::Ultrasonic;
        assert!(config.validate().is_err());

        let mut lowered = config.clone();
        lowered.ultrasonic.tone_hz = 12000.0;
        assert!(!lowered.ultrasonic_guard_fits());
        assert!(lowered.validate().is_err());
        lowered.ultrasonic.carrier_cutoff_hz = 8000.0;
        lowered.validate().unwrap();
    }

    #[test]
    fn test_ultrasonic_guard_below_lower_sideband() {
        let mut config = CodecConfig::default();
        assert!(config.ultrasonic_guard_fits());
        config.ultrasonic.carrier_cutoff_hz = 16000.0;
        assert!(matches!(
            config.validate(),
            Err(CodecError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_phase_smoothing_and_marker_checked() {
        let mut config = CodecConfig::default();
        config.phase.smoothing_cutoff_hz = config.phase.carrier_cutoff_hz;
        assert!(config.validate().is_err());

        let mut config = CodecConfig::default();
        config.phase.marker_depth = 0.0;
        assert!(config.validate().is_err());

        let mut config = CodecConfig::default();
        config.phase.marker_hz = -40.0;
        assert!(config.validate().is_err());

        let mut config = CodecConfig::default();
        config.phase.smoothing_length = 4096;
        assert!(matches!(
            config.validate(),
            Err(CodecError::InvalidKernelLength { length: 4096 })
        ));
    }

    #[test]
    fn test_rejects_non_positive_values() {
        let mut config = CodecConfig::default();
        config.frequency_scale = 0.0;
        assert!(config.validate().is_err());

        let mut config = CodecConfig::default();
        config.output_peak = 1.5;
        assert!(config.validate().is_err());

        let mut config = CodecConfig::default();
        config.secondary.max_energy = 0.0;
        assert!(config.validate().is_err());
    }
}
