//! JSON output types for machine-readable CLI output.
//!
//! Every subcommand that takes `--json` prints exactly one of these structs
//! to stdout. Failures are reported in the same struct with
//! `success: false` and a list of [`JsonError`]s.

use serde::{Deserialize, Serialize};

use warbler_codec::CodecError;

/// Error codes for CLI operations.
///
/// Codec errors pass through with their own `CODEC_XXX` code.
pub mod error_codes {
    /// Input or output file problem
    pub const FILE_IO: &str = "CLI_001";
    /// Configuration file could not be read or parsed
    pub const CONFIG: &str = "CLI_002";
    /// JSON serialization error
    pub const JSON_SERIALIZE: &str = "CLI_003";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "CODEC_004")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl JsonError {
    /// Creates a new error with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Classifies an error chain.
    ///
    /// A codec error anywhere in the chain keeps its own code; otherwise the
    /// context decides between a configuration and a file problem.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let message = format!("{:#}", err);
        if let Some(codec) = err.chain().find_map(|e| e.downcast_ref::<CodecError>()) {
            return Self::new(codec.code(), message);
        }
        if err
            .chain()
            .any(|e| e.downcast_ref::<serde_json::Error>().is_some())
            || message.contains("config")
        {
            return Self::new(error_codes::CONFIG, message);
        }
        Self::new(error_codes::FILE_IO, message)
    }
}

/// Result of `warbler encode --json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EncodeOutput {
    /// Whether encoding succeeded
    pub success: bool,
    /// Input WAV path
    pub input: String,
    /// Output WAV path
    pub output: String,
    /// Embedding strategy used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Ratio between carrier and voice fundamentals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_ratio: Option<f64>,
    /// Written audio, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioInfo>,
    /// Errors (empty on success)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JsonError>,
}

/// Result of `warbler decode --json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DecodeOutput {
    /// Whether the command ran without error
    pub success: bool,
    /// Whether a voice was recovered
    pub recovered: bool,
    /// Input WAV path
    pub input: String,
    /// Output WAV path
    pub output: String,
    /// Strategy that produced the voice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Strategies tried, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempted: Vec<String>,
    /// Written audio, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioInfo>,
    /// Errors (empty on success)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JsonError>,
}

/// Result of `warbler inspect --json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InspectOutput {
    /// Whether the command ran without error
    pub success: bool,
    /// Input WAV path
    pub input: String,
    /// Side channel whose gate passed, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected: Option<String>,
    /// Signal measurements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<SignalMetrics>,
    /// Errors (empty on success)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JsonError>,
}

/// Result of `warbler sweep --json` and `warbler noise --json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SignalOutput {
    /// Whether the file was written
    pub success: bool,
    /// Output WAV path
    pub output: String,
    /// Written audio, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioInfo>,
    /// Errors (empty on success)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JsonError>,
}

/// Description of a written WAV file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioInfo {
    /// Number of channels
    pub channels: usize,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Samples per channel
    pub num_samples: usize,
    /// Duration in seconds
    pub duration_seconds: f64,
    /// BLAKE3 hash of the 16-bit PCM data
    pub pcm_hash: String,
}

impl From<&crate::wav::WavSummary> for AudioInfo {
    fn from(summary: &crate::wav::WavSummary) -> Self {
        let duration_seconds = if summary.sample_rate == 0 {
            0.0
        } else {
            summary.num_samples as f64 / summary.sample_rate as f64
        };
        Self {
            channels: summary.channels,
            sample_rate: summary.sample_rate,
            num_samples: summary.num_samples,
            duration_seconds,
            pcm_hash: summary.pcm_hash.clone(),
        }
    }
}

/// Level and pitch measurements of the first channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalMetrics {
    /// Number of channels
    pub channels: usize,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration_seconds: f64,
    /// Peak absolute sample
    pub peak: f64,
    /// RMS level
    pub rms: f64,
    /// Zero-crossing estimate of the dominant frequency in Hz
    pub dominant_frequency_hz: f64,
    /// RMS of the second channel, for stereo input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_channel_rms: Option<f64>,
}

/// Serializes a report, falling back to a minimal error object.
pub fn to_json_string<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        format!(
            r#"{{"success":false,"errors":[{{"code":"{}","message":"{}"}}]}}"#,
            error_codes::JSON_SERIALIZE,
            e.to_string().replace('"', "'")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_codec_errors_keep_their_code() {
        let err = Err::<(), _>(CodecError::invalid_param("scale", "must be positive"))
            .context("Invalid codec configuration")
            .unwrap_err();
        assert_eq!(JsonError::from_anyhow(&err).code, "CODEC_004");
    }

    #[test]
    fn test_file_errors() {
        let err = std::fs::read("/nonexistent/input.wav")
            .context("Failed to open WAV file: /nonexistent/input.wav")
            .unwrap_err();
        let json = JsonError::from_anyhow(&err);
        assert_eq!(json.code, error_codes::FILE_IO);
        assert!(json.message.contains("input.wav"));
    }

    #[test]
    fn test_optional_fields_are_skipped() {
        let output = DecodeOutput {
            success: true,
            recovered: false,
            input: "bird.wav".to_string(),
            output: "voice.wav".to_string(),
            attempted: vec!["secondary_channel".to_string(), "none".to_string()],
            ..Default::default()
        };
        let value: serde_json::Value = serde_json::from_str(&to_json_string(&output)).unwrap();
        assert!(value.get("strategy").is_none());
        assert!(value.get("errors").is_none());
        assert_eq!(value["attempted"][1], "none");

        let parsed: DecodeOutput = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, output);
    }
}
