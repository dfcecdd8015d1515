//! Warbler codec core
//!
//! Disguises speech as birdsong and recovers it again.
//!
//! # Overview
//!
//! Encoding extracts the pitch and loudness contours of a voice with an
//! analytic-signal demodulator, resynthesizes them several octaves higher
//! with a phase-accumulator oscillator, and then hides the original voice
//! alongside the chirping carrier with one of several embedding strategies.
//! Decoding checks for each strategy in a fixed order and, when none is
//! present, falls back to inverting the carrier itself.
//!
//! The crate works on plain [`SampleBuffer`]s. Reading and writing audio
//! files is left to the caller.
//!
//! # Example
//!
//! ```
//! use warbler_codec::{CodecConfig, Decoder, Encoder, SampleBuffer};
//! use warbler_codec::testsignal::linear_sweep;
//!
//! let voice = SampleBuffer::mono(linear_sweep(200.0, 800.0, 0.25, 44100, 0.8), 44100);
//!
//! let encoded = Encoder::new(CodecConfig::default())?.encode(&voice)?;
//! let outcome = Decoder::new(CodecConfig::default())?.decode(&encoded.buffer)?;
//! assert!(outcome.is_recovered());
//! # Ok::<(), warbler_codec::CodecError>(())
//! ```
//!
//! # Crate Structure
//!
//! - [`codec`] - Whole-buffer [`Encoder`] and [`Decoder`]
//! - [`stream`] - Allocation-free block encoder
//! - [`embed`] - Embedding strategies and detection order
//! - [`filter`] - Hilbert and windowed-sinc kernel design
//! - [`convolve`] - Offline and ring-buffer convolution
//! - [`analytic`] - I/Q signals, frequency shifting, band filter
//! - [`demod`] - FM/AM demodulation, median filter, phase unwrapping
//! - [`synthesis`] - Contour-driven oscillator
//! - [`normalize`] - Peak, RMS, DC and clipping utilities
//! - [`config`] - Serializable configuration
//! - [`analysis`], [`testsignal`], [`rng`] - Measurement and fixtures

pub mod analysis;
pub mod analytic;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod convolve;
pub mod demod;
pub mod embed;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod oscillator;
pub mod rng;
pub mod stream;
pub mod synthesis;
pub mod testsignal;

pub use buffer::SampleBuffer;
pub use codec::{DecodeOutcome, Decoder, EncodeOutput, Encoder};
pub use config::CodecConfig;
pub use embed::{EmbeddingStrategy, StrategyKind};
pub use error::{CodecError, CodecResult};
pub use oscillator::Waveshape;
pub use stream::StreamEncoder;
