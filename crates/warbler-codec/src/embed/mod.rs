//! Side-channel embedding strategies.
//!
//! Each strategy hides the original voice on top of the synthesized carrier
//! so that decode can return the voice itself instead of a lossy
//! reconstruction. At decode time the strategies are tried in
//! [`detection_order`]; each has its own energy gate and the first one that
//! passes wins. [`dsp::DspInversion`] is the fallback when none does.
//!
//! # Strategies
//!
//! - [`secondary::SecondaryChannel`] - attenuated voice on a second channel
//! - [`ultrasonic::UltrasonicCarrier`] - voice amplitude-modulated onto a
//!   near-ultrasonic tone
//! - [`phase::PhaseChannel`] - voice added to the carrier's analytic phase
//! - [`dsp::DspInversion`] - no side channel; decode inverts the carrier

pub mod dsp;
pub mod phase;
pub mod secondary;
pub mod ultrasonic;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::buffer::SampleBuffer;
use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};

pub use dsp::DspInversion;
pub use phase::PhaseChannel;
pub use secondary::SecondaryChannel;
pub use ultrasonic::UltrasonicCarrier;

/// Identifies an embedding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Voice on a second, heavily attenuated channel.
    #[default]
    SecondaryChannel,
    /// Voice on a suppressed-carrier AM tone near 19 kHz.
    Ultrasonic,
    /// Voice in the carrier's instantaneous phase.
    PhaseChannel,
    /// No side channel.
    None,
}

impl StrategyKind {
    /// Every strategy, in detection order followed by the fallback.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::SecondaryChannel,
        StrategyKind::Ultrasonic,
        StrategyKind::PhaseChannel,
        StrategyKind::None,
    ];

    /// Stable snake_case name, identical to the serde representation.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::SecondaryChannel => "secondary_channel",
            StrategyKind::Ultrasonic => "ultrasonic",
            StrategyKind::PhaseChannel => "phase_channel",
            StrategyKind::None => "none",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                format!(
                    "unknown strategy '{}' (expected one of: secondary_channel, ultrasonic, phase_channel, none)",
                    s
                )
            })
    }
}

/// Fixed order in which decode looks for an embedded voice.
pub fn detection_order() -> [StrategyKind; 3] {
    [
        StrategyKind::SecondaryChannel,
        StrategyKind::Ultrasonic,
        StrategyKind::PhaseChannel,
    ]
}

/// A way of carrying the original voice alongside the carrier.
///
/// Implementations are built once per configuration and hold any filter
/// kernels they need, so both methods are pure functions of their inputs.
pub trait EmbeddingStrategy: fmt::Debug + Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Combines the normalized carrier with the original voice.
    ///
    /// `carrier` and `voice` must have the same length.
    fn embed(&self, carrier: &[f64], voice: &[f64]) -> CodecResult<SampleBuffer>;

    /// Recovers the voice if this strategy's energy gate passes.
    ///
    /// The returned voice is not level-normalized.
    fn try_decode(&self, input: &SampleBuffer) -> Option<Vec<f64>>;
}

/// Builds the strategy named by `kind` for a validated configuration.
pub fn build_strategy(
    kind: StrategyKind,
    config: &CodecConfig,
) -> CodecResult<Box<dyn EmbeddingStrategy>> {
    let strategy: Box<dyn EmbeddingStrategy> = match kind {
        StrategyKind::SecondaryChannel => {
            Box::new(SecondaryChannel::new(&config.secondary, config.sample_rate)?)
        }
        StrategyKind::Ultrasonic => {
            Box::new(UltrasonicCarrier::new(&config.ultrasonic, config.sample_rate)?)
        }
        StrategyKind::PhaseChannel => Box::new(PhaseChannel::new(
            &config.phase,
            config.hilbert_length,
            config.sample_rate,
        )?),
        StrategyKind::None => Box::new(DspInversion::new(config)?),
    };
    Ok(strategy)
}

pub(crate) fn check_lengths(carrier: &[f64], voice: &[f64]) -> CodecResult<()> {
    if carrier.len() != voice.len() {
        return Err(CodecError::LengthMismatch {
            what: "voice",
            expected: carrier.len(),
            actual: voice.len(),
        });
    }
    Ok(())
}

/// Leading `seconds` of a signal, at most the whole signal.
pub(crate) fn detection_window(signal: &[f64], seconds: f64, sample_rate: u32) -> &[f64] {
    let len = ((seconds * sample_rate as f64) as usize).clamp(1, signal.len().max(1));
    &signal[..len.min(signal.len())]
}
