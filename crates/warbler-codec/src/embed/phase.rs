//! Phase-channel embedding.
//!
//! The voice is written into the phase of a smoothed copy of the carrier:
//!
//! ```text
//! out[n] = A[n] · (1 + μ · sin(ω_m · n)) · cos(φ[n] + k · voice[n])
//! ```
//!
//! `φ` and `A` are the carrier's unwrapped analytic phase and magnitude,
//! both lowpassed far below the voice band. Smoothing strips the carrier's
//! own fast phase wobble (harmonics, noise) so decode can take everything
//! above the carrier-estimate cutoff as voice. The `μ` tremolo at `ω_m` is a
//! presence marker: decode projects the output envelope onto it, and a
//! plain carrier never carries it at the right depth and phase.

use std::f64::consts::PI;

use tracing::debug;

use super::{check_lengths, EmbeddingStrategy, StrategyKind};
use crate::analysis::interior;
use crate::analytic::{analytic, angular_frequency, IqBuffer};
use crate::buffer::SampleBuffer;
use crate::config::PhaseConfig;
use crate::convolve::{convolve, convolve_odd_extended};
use crate::demod::{am, unwrap_phase};
use crate::error::CodecResult;
use crate::filter::FirKernel;
use crate::normalize::{normalize_peak, peak, remove_dc, rms};

/// Smoothed magnitude is floored at this fraction of its peak so the phase
/// stays audible through near-silent stretches.
const MAGNITUDE_FLOOR: f64 = 1e-3;

/// Envelope projection onto the marker tremolo.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarkerReading {
    /// Relative depth of the in-phase (sine) component.
    pub depth: f64,
    /// Relative depth of the quadrature (cosine) component.
    pub quadrature: f64,
}

/// Voice carried in the instantaneous phase.
#[derive(Debug, Clone)]
pub struct PhaseChannel {
    config: PhaseConfig,
    sample_rate: u32,
    marker: f64,
    hilbert: FirKernel,
    smoothing: FirKernel,
    carrier_lowpass: FirKernel,
    voice_band: FirKernel,
}

impl PhaseChannel {
    /// Creates the strategy.
    pub fn new(config: &PhaseConfig, hilbert_length: usize, sample_rate: u32) -> CodecResult<Self> {
        let rate = sample_rate as f64;
        Ok(Self {
            config: config.clone(),
            sample_rate,
            marker: angular_frequency(config.marker_hz, rate),
            hilbert: FirKernel::hilbert(hilbert_length)?,
            smoothing: FirKernel::sinc_lowpass(
                config.smoothing_cutoff_hz,
                config.smoothing_length,
                rate,
            )?,
            carrier_lowpass: FirKernel::sinc_lowpass(
                config.carrier_cutoff_hz,
                config.carrier_length,
                rate,
            )?,
            voice_band: FirKernel::sinc_lowpass(config.voice_cutoff_hz, config.voice_length, rate)?,
        })
    }

    /// Phase modulation left after removing the estimated carrier phase,
    /// scaled back to voice units.
    pub fn recover(&self, signal: &[f64]) -> Vec<f64> {
        self.recover_from(&analytic(signal, &self.hilbert))
    }

    fn recover_from(&self, iq: &IqBuffer) -> Vec<f64> {
        let unwrapped = unwrap_phase(iq);
        let carrier_phase = convolve_odd_extended(&unwrapped, &self.carrier_lowpass);

        let mut residual: Vec<f64> = unwrapped
            .iter()
            .zip(&carrier_phase)
            .map(|(u, c)| (u - c) / self.config.modulation_index)
            .collect();
        remove_dc(&mut residual);
        convolve(&residual, &self.voice_band)
    }

    /// Projects the envelope of `signal` onto the marker tremolo.
    pub fn read_marker(&self, signal: &[f64]) -> MarkerReading {
        self.marker_from(&am(&analytic(signal, &self.hilbert)))
    }

    /// Hann-weighted coherent projection over the interior, normalized by
    /// the weighted mean envelope so the reading is level-independent.
    fn marker_from(&self, envelope: &[f64]) -> MarkerReading {
        let span = interior(envelope.len(), self.carrier_lowpass.len());
        let width = span.len();
        if width < 2 {
            return MarkerReading::default();
        }

        let (mut sine, mut cosine, mut total) = (0.0, 0.0, 0.0);
        for (offset, n) in span.enumerate() {
            let window = 0.5 - 0.5 * (2.0 * PI * offset as f64 / (width - 1) as f64).cos();
            let weighted = window * envelope[n];
            let (sin, cos) = (self.marker * n as f64).sin_cos();
            sine += weighted * sin;
            cosine += weighted * cos;
            total += weighted;
        }
        if total <= 0.0 {
            return MarkerReading::default();
        }
        MarkerReading {
            depth: 2.0 * sine / total,
            quadrature: 2.0 * cosine / total,
        }
    }

    fn marker_present(&self, reading: &MarkerReading) -> bool {
        let depth = self.config.marker_depth;
        (reading.depth - depth).abs() < depth / 2.0 && reading.quadrature.abs() < depth / 2.0
    }
}

impl EmbeddingStrategy for PhaseChannel {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PhaseChannel
    }

    fn embed(&self, carrier: &[f64], voice: &[f64]) -> CodecResult<SampleBuffer> {
        check_lengths(carrier, voice)?;

        let mut voice = voice.to_vec();
        normalize_peak(&mut voice, 1.0);

        let iq = analytic(carrier, &self.hilbert);
        let phase = convolve_odd_extended(&unwrap_phase(&iq), &self.smoothing);
        let magnitude = convolve(&am(&iq), &self.smoothing);
        let floor = peak(&magnitude) * MAGNITUDE_FLOOR;

        let depth = self.config.marker_depth;
        let index = self.config.modulation_index;
        let mut output: Vec<f64> = phase
            .iter()
            .zip(&magnitude)
            .zip(&voice)
            .enumerate()
            .map(|(n, ((&phi, &a), &v))| {
                let tremolo = 1.0 + depth * (self.marker * n as f64).sin();
                a.max(floor) * tremolo * (phi + index * v).cos()
            })
            .collect();
        normalize_peak(&mut output, peak(carrier));

        Ok(SampleBuffer::mono(output, self.sample_rate))
    }

    fn try_decode(&self, input: &SampleBuffer) -> Option<Vec<f64>> {
        let signal = input.primary();
        if signal.is_empty() {
            return None;
        }

        let iq = analytic(signal, &self.hilbert);
        let reading = self.marker_from(&am(&iq));
        if !self.marker_present(&reading) {
            debug!(
                depth = reading.depth,
                quadrature = reading.quadrature,
                "phase channel marker absent"
            );
            return None;
        }

        // Edge transients of the encode filters and of the carrier estimate
        // both fit inside one carrier-estimate kernel length.
        let recovered = self.recover_from(&iq);
        let level = rms(&recovered[interior(recovered.len(), self.carrier_lowpass.len())]);
        let present = level > self.config.min_rms;
        debug!(
            depth = reading.depth,
            quadrature = reading.quadrature,
            rms = level,
            present,
            "phase channel gate"
        );
        present.then_some(recovered)
    }
}
