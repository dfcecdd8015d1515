//! Error types for the codec core.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while configuring or running the codec.
///
/// Every variant is a configuration or shape problem detected before any
/// sample is processed. Numeric degeneracies inside the pipelines (silent
/// input, `atan2(0, 0)`, zero peaks) are handled in place and never surface
/// here.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Invalid sample rate.
    #[error("invalid sample rate: {rate} Hz")]
    InvalidSampleRate {
        /// The rejected sample rate.
        rate: u32,
    },

    /// FIR kernel length is even or too short.
    #[error("invalid kernel length {length}: must be odd and at least 3")]
    InvalidKernelLength {
        /// The rejected length.
        length: usize,
    },

    /// Lowpass cutoff outside (0, Nyquist).
    #[error("invalid cutoff {cutoff} Hz: must be in (0, {nyquist}) Hz")]
    InvalidCutoff {
        /// Requested cutoff.
        cutoff: f64,
        /// Nyquist frequency for the sample rate in use.
        nyquist: f64,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// Unsupported channel count.
    #[error("unsupported channel count: {channels} (expected 1 or 2)")]
    ChannelCount {
        /// Number of channels found.
        channels: usize,
    },

    /// Two buffers that must line up sample for sample do not.
    #[error("length mismatch: {what} has {actual} samples, expected {expected}")]
    LengthMismatch {
        /// Which buffer was wrong.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// A streaming block exceeded the size the stream was built for.
    #[error("block of {len} samples exceeds the preallocated block size {max}")]
    BlockTooLarge {
        /// Offending block length.
        len: usize,
        /// Block size fixed at stream start.
        max: usize,
    },

    /// Embedding strategy has no streaming implementation.
    #[error("embedding strategy '{strategy}' is not available in streaming mode")]
    UnsupportedStreaming {
        /// Strategy name.
        strategy: &'static str,
    },
}

impl CodecError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            CodecError::InvalidSampleRate { .. } => "CODEC_001",
            CodecError::InvalidKernelLength { .. } => "CODEC_002",
            CodecError::InvalidCutoff { .. } => "CODEC_003",
            CodecError::InvalidParameter { .. } => "CODEC_004",
            CodecError::ChannelCount { .. } => "CODEC_005",
            CodecError::LengthMismatch { .. } => "CODEC_006",
            CodecError::BlockTooLarge { .. } => "CODEC_007",
            CodecError::UnsupportedStreaming { .. } => "CODEC_008",
        }
    }
}
