//! Plain carrier with no side channel; decode inverts the synthesis.
//!
//! The reconstruction demodulates the carrier, smooths the pitch and
//! envelope contours and resynthesizes them through
//! [`Synthesizer::inverse`]. It brings back the pitch track and the
//! loudness, not the original waveform.

use tracing::debug;

use super::{check_lengths, EmbeddingStrategy, StrategyKind};
use crate::analytic::analytic;
use crate::buffer::SampleBuffer;
use crate::config::{CodecConfig, InversionConfig};
use crate::convolve::{convolve, convolve_odd_extended};
use crate::demod::{am, fm, median_filter};
use crate::error::CodecResult;
use crate::filter::FirKernel;
use crate::normalize::{peak, remove_dc};
use crate::oscillator::PhaseAccumulator;
use crate::synthesis::Synthesizer;

/// Best-effort inversion of the carrier itself.
#[derive(Debug, Clone)]
pub struct DspInversion {
    config: InversionConfig,
    sample_rate: u32,
    hilbert: FirKernel,
    contour_lowpass: FirKernel,
    voice_band: FirKernel,
    synthesizer: Synthesizer,
}

impl DspInversion {
    /// Creates the inversion for the synthesizer described by `config`.
    pub fn new(config: &CodecConfig) -> CodecResult<Self> {
        let rate = config.sample_rate as f64;
        let inversion = &config.inversion;
        let forward = Synthesizer::new(
            rate,
            config.frequency_scale,
            config.harmonic_multiplier,
            config.waveshape,
        )?;

        Ok(Self {
            config: inversion.clone(),
            sample_rate: config.sample_rate,
            hilbert: FirKernel::hilbert(config.hilbert_length)?,
            contour_lowpass: FirKernel::sinc_lowpass(
                inversion.contour_cutoff_hz,
                inversion.contour_length,
                rate,
            )?,
            voice_band: FirKernel::sinc_lowpass(
                inversion.voice_cutoff_hz,
                inversion.voice_length,
                rate,
            )?,
            synthesizer: forward.inverse(),
        })
    }

    /// Reconstructs a voice-register signal from a carrier.
    pub fn reconstruct(&self, signal: &[f64]) -> Vec<f64> {
        let iq = analytic(signal, &self.hilbert);

        let raw_freq = median_filter(&fm(&iq), self.config.median_window);
        let freq = convolve_odd_extended(&raw_freq, &self.contour_lowpass);
        let envelope = convolve_odd_extended(&am(&iq), &self.contour_lowpass);

        let mut phase = PhaseAccumulator::new();
        let resynthesized: Vec<f64> = freq
            .iter()
            .zip(&envelope)
            .map(|(&f, &e)| self.synthesizer.render_sample(&mut phase, f, e))
            .collect();

        let mut voice = convolve(&resynthesized, &self.voice_band);
        remove_dc(&mut voice);
        voice
    }
}

impl EmbeddingStrategy for DspInversion {
    fn kind(&self) -> StrategyKind {
        StrategyKind::None
    }

    fn embed(&self, carrier: &[f64], voice: &[f64]) -> CodecResult<SampleBuffer> {
        check_lengths(carrier, voice)?;
        Ok(SampleBuffer::mono(carrier.to_vec(), self.sample_rate))
    }

    fn try_decode(&self, input: &SampleBuffer) -> Option<Vec<f64>> {
        let signal = input.primary();
        if signal.is_empty() {
            return None;
        }

        let voice = self.reconstruct(signal);
        let level = peak(&voice);
        let audible = level >= self.config.silence_threshold;
        debug!(peak = level, audible, "dsp inversion");
        audible.then_some(voice)
    }
}
