//! Secondary-channel embedding: the voice rides on channel 2 at -60 dB.

use tracing::debug;

use super::{check_lengths, detection_window, EmbeddingStrategy, StrategyKind};
use crate::buffer::SampleBuffer;
use crate::config::SecondaryConfig;
use crate::error::CodecResult;
use crate::normalize::mean_square;

/// Carrier on channel 1, attenuated voice on channel 2.
#[derive(Debug, Clone)]
pub struct SecondaryChannel {
    config: SecondaryConfig,
    sample_rate: u32,
}

impl SecondaryChannel {
    /// Creates the strategy.
    pub fn new(config: &SecondaryConfig, sample_rate: u32) -> CodecResult<Self> {
        Ok(Self {
            config: config.clone(),
            sample_rate,
        })
    }

    /// Gain applied to the hidden voice.
    pub fn hidden_gain(&self) -> f64 {
        self.config.hidden_gain
    }

    /// Mean-square energy of channel 2 over the detection window, if present.
    pub fn hidden_energy(&self, input: &SampleBuffer) -> Option<f64> {
        let hidden = input.channel(1)?;
        Some(mean_square(detection_window(
            hidden,
            self.config.detection_seconds,
            self.sample_rate,
        )))
    }
}

impl EmbeddingStrategy for SecondaryChannel {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SecondaryChannel
    }

    fn embed(&self, carrier: &[f64], voice: &[f64]) -> CodecResult<SampleBuffer> {
        check_lengths(carrier, voice)?;
        let hidden = voice.iter().map(|s| s * self.config.hidden_gain).collect();
        SampleBuffer::stereo(carrier.to_vec(), hidden, self.sample_rate)
    }

    fn try_decode(&self, input: &SampleBuffer) -> Option<Vec<f64>> {
        let energy = self.hidden_energy(input)?;
        let present = energy > self.config.min_energy && energy <= self.config.max_energy;
        debug!(energy, present, "secondary channel gate");
        if !present {
            return None;
        }
        input.channel(1).map(<[f64]>::to_vec)
    }
}
