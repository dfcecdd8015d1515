//! Effective codec configuration for a command.
//!
//! A JSON file (every field optional) is read first, then command-line
//! overrides are applied, then the sample rate is taken from the input WAV.

use anyhow::{Context, Result};
use clap::Args;
use std::fs;

use warbler_codec::{CodecConfig, StrategyKind};

/// Configuration flags shared by the codec subcommands.
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct ConfigOverrides {
    /// Path to a JSON codec configuration file
    #[arg(long)]
    pub config: Option<String>,

    /// Embedding strategy (secondary_channel, ultrasonic, phase_channel, none)
    #[arg(long)]
    pub strategy: Option<StrategyKind>,

    /// Frequency-scale factor of the carrier synthesizer
    #[arg(long)]
    pub scale: Option<f64>,
}

/// Loads a configuration file, or the defaults when no path is given.
pub fn load_config(path: Option<&str>) -> Result<CodecConfig> {
    let Some(path) = path else {
        return Ok(CodecConfig::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse config file: {}", path))
}

/// Builds and validates the configuration for one run.
///
/// # Arguments
/// * `overrides` - Config file and flag overrides
/// * `sample_rate` - Rate of the input audio, or `None` to keep the file's value
pub fn resolve(overrides: &ConfigOverrides, sample_rate: Option<u32>) -> Result<CodecConfig> {
    let mut config = load_config(overrides.config.as_deref())?;
    if let Some(strategy) = overrides.strategy {
        config.strategy = strategy;
    }
    if let Some(scale) = overrides.scale {
        config.frequency_scale = scale;
    }
    if let Some(rate) = sample_rate {
        config.sample_rate = rate;
    }
    config.validate().context("Invalid codec configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(&ConfigOverrides::default(), None).unwrap();
        assert_eq!(config, CodecConfig::default());
    }

    #[test]
    fn test_partial_file_and_overrides() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("codec.json");
        fs::write(&path, r#"{ "strategy": "ultrasonic", "output_peak": 0.5 }"#).unwrap();

        let overrides = ConfigOverrides {
            config: Some(path.to_string_lossy().into_owned()),
            strategy: None,
            scale: Some(25000.0),
        };
        let config = resolve(&overrides, Some(48000)).unwrap();
        assert_eq!(config.strategy, StrategyKind::Ultrasonic);
        assert_eq!(config.output_peak, 0.5);
        assert_eq!(config.frequency_scale, 25000.0);
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.hilbert_length, CodecConfig::default().hilbert_length);
    }

    #[test]
    fn test_flag_beats_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("codec.json");
        fs::write(&path, r#"{ "strategy": "ultrasonic" }"#).unwrap();

        let overrides = ConfigOverrides {
            config: Some(path.to_string_lossy().into_owned()),
            strategy: Some(StrategyKind::PhaseChannel),
            scale: None,
        };
        assert_eq!(
            resolve(&overrides, None).unwrap().strategy,
            StrategyKind::PhaseChannel
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let overrides = ConfigOverrides {
            scale: Some(-1.0),
            ..Default::default()
        };
        assert!(resolve(&overrides, None).is_err());

        // The ultrasonic tone does not fit under 8 kHz Nyquist.
        let overrides = ConfigOverrides {
            strategy: Some(StrategyKind::Ultrasonic),
            ..Default::default()
        };
        assert!(resolve(&overrides, Some(16000)).is_err());
    }

    #[test]
    fn test_missing_and_malformed_files() {
        assert!(load_config(Some("/nonexistent/codec.json")).is_err());

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_config(Some(path.to_str().unwrap())).is_err());
    }
}
