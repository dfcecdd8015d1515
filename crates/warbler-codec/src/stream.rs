//! Block-based streaming encoder.
//!
//! Runs the encode front end sample by sample with the same kernels and the
//! same arithmetic as [`crate::codec::Encoder`], for use inside an audio
//! callback. Every buffer is allocated in [`StreamEncoder::new`];
//! [`StreamEncoder::process_block`] only indexes into them.
//!
//! The output lags the input by [`StreamEncoder::latency`] samples: half the
//! Hilbert kernel, half the baseband lowpass, and one sample so that the
//! first frequency estimate can be copied from the second. The first
//! `latency()` output samples are silence.
//!
//! Offline encode normalizes by the peak of the whole carrier. A stream
//! cannot see ahead, so it divides by the largest raw sample seen so far;
//! once the loudest moment has passed the two agree exactly.

use crate::analytic::{angular_frequency, rotate, ShiftDirection};
use crate::config::CodecConfig;
use crate::convolve::StreamingFir;
use crate::demod::fm_step;
use crate::embed::StrategyKind;
use crate::error::{CodecError, CodecResult};
use crate::filter::FirKernel;
use crate::oscillator::{PhaseAccumulator, TWO_PI};
use crate::synthesis::Synthesizer;

/// Fixed integer delay over a ring buffer.
#[derive(Debug, Clone)]
struct DelayLine {
    buffer: Vec<f64>,
    write_pos: usize,
}

impl DelayLine {
    fn new(delay: usize) -> Self {
        Self {
            buffer: vec![0.0; delay + 1],
            write_pos: 0,
        }
    }

    /// Writes a sample and returns the one written `delay` pushes ago.
    #[inline]
    fn process(&mut self, sample: f64) -> f64 {
        let len = self.buffer.len();
        self.buffer[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % len;
        self.buffer[self.write_pos]
    }

    fn reset(&mut self) {
        self.buffer.iter_mut().for_each(|s| *s = 0.0);
        self.write_pos = 0;
    }
}

/// Frequency and envelope of the previous baseband sample, waiting for the
/// next one before it is rendered.
#[derive(Debug, Clone, Copy)]
struct Held {
    freq: f64,
    envelope: f64,
}

/// Streaming voice-to-birdsong encoder.
#[derive(Debug, Clone)]
pub struct StreamEncoder {
    strategy: StrategyKind,
    max_block: usize,
    hilbert_mid: u64,
    lowpass_mid: u64,
    latency: usize,

    hilbert: StreamingFir,
    in_phase: DelayLine,
    lowpass_i: StreamingFir,
    lowpass_q: StreamingFir,
    voice: DelayLine,

    shift: f64,
    down_phase: f64,
    up_phase: f64,

    samples_in: u64,
    prev_band: (f64, f64),
    held: Option<Held>,

    synthesizer: Synthesizer,
    phase: PhaseAccumulator,
    running_peak: f64,
    output_peak: f64,
    hidden_gain: f64,
}

impl StreamEncoder {
    /// Builds a stream for blocks of at most `config.block_size` samples.
    ///
    /// Only the `none` and `secondary_channel` strategies stream; the
    /// others need the whole carrier and are rejected here.
    pub fn new(config: CodecConfig) -> CodecResult<Self> {
        config.validate()?;
        match config.strategy {
            StrategyKind::None | StrategyKind::SecondaryChannel => {}
            other => {
                return Err(CodecError::UnsupportedStreaming {
                    strategy: other.name(),
                })
            }
        }
        let max_block = config.block_size;
        let rate = config.sample_rate as f64;
        let hilbert = FirKernel::hilbert(config.hilbert_length)?;
        let lowpass = FirKernel::sinc_lowpass(
            config.baseband.cutoff_hz,
            config.baseband.length,
            rate,
        )?;
        let hilbert_mid = hilbert.mid();
        let lowpass_mid = lowpass.mid();
        let latency = hilbert_mid + lowpass_mid + 1;
        let shift = angular_frequency(config.baseband.shift_hz, rate);

        let mut stream = Self {
            strategy: config.strategy,
            max_block,
            hilbert_mid: hilbert_mid as u64,
            lowpass_mid: lowpass_mid as u64,
            latency,
            hilbert: StreamingFir::new(hilbert, max_block),
            in_phase: DelayLine::new(hilbert_mid),
            lowpass_i: StreamingFir::new(lowpass.clone(), max_block),
            lowpass_q: StreamingFir::new(lowpass, max_block),
            voice: DelayLine::new(latency),
            shift,
            down_phase: 0.0,
            up_phase: 0.0,
            samples_in: 0,
            prev_band: (0.0, 0.0),
            held: None,
            synthesizer: Synthesizer::new(
                rate,
                config.frequency_scale,
                config.harmonic_multiplier,
                config.waveshape,
            )?,
            phase: PhaseAccumulator::new(),
            running_peak: 0.0,
            output_peak: config.output_peak,
            hidden_gain: config.secondary.hidden_gain,
        };
        stream.reset();
        Ok(stream)
    }

    /// Delay between an input sample and the output it drives.
    pub fn latency(&self) -> usize {
        self.latency
    }

    /// Largest accepted block.
    pub fn max_block(&self) -> usize {
        self.max_block
    }

    /// Strategy the stream was built for.
    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Returns to the initial state, as if no sample had been seen.
    pub fn reset(&mut self) {
        self.hilbert.reset();
        self.in_phase.reset();
        self.lowpass_i.reset();
        self.lowpass_q.reset();
        self.voice.reset();
        // Rotations are aligned with the offline shifter, whose phase is
        // `shift · n` for the sample each stage is currently emitting.
        self.down_phase = wrap(-self.shift * self.hilbert_mid as f64);
        self.up_phase = wrap(-self.shift * (self.hilbert_mid + self.lowpass_mid) as f64);
        self.samples_in = 0;
        self.prev_band = (0.0, 0.0);
        self.held = None;
        self.phase.reset();
        self.running_peak = 0.0;
    }

    /// Encodes one block into a mono carrier.
    ///
    /// `output` must be as long as `input`.
    pub fn process_block(&mut self, input: &[f64], output: &mut [f64]) -> CodecResult<()> {
        self.check_block(input.len(), output.len())?;
        for (x, out) in input.iter().zip(output.iter_mut()) {
            *out = self.step(*x);
            self.voice.process(*x);
        }
        Ok(())
    }

    /// Encodes one block into carrier (left) and hidden voice (right).
    ///
    /// The hidden voice is delayed by the same latency as the carrier.
    pub fn process_block_stereo(
        &mut self,
        input: &[f64],
        left: &mut [f64],
        right: &mut [f64],
    ) -> CodecResult<()> {
        if self.strategy != StrategyKind::SecondaryChannel {
            return Err(CodecError::invalid_param(
                "strategy",
                "stereo streaming needs the secondary_channel strategy",
            ));
        }
        self.check_block(input.len(), left.len())?;
        self.check_block(input.len(), right.len())?;

        for ((x, l), r) in input.iter().zip(left.iter_mut()).zip(right.iter_mut()) {
            *l = self.step(*x);
            *r = self.voice.process(*x) * self.hidden_gain;
        }
        Ok(())
    }

    fn check_block(&self, input: usize, output: usize) -> CodecResult<()> {
        if input > self.max_block {
            return Err(CodecError::BlockTooLarge {
                len: input,
                max: self.max_block,
            });
        }
        if output != input {
            return Err(CodecError::LengthMismatch {
                what: "output block",
                expected: input,
                actual: output,
            });
        }
        Ok(())
    }

    /// Advances every stage by one sample and returns one carrier sample.
    #[inline]
    fn step(&mut self, x: f64) -> f64 {
        let t = self.samples_in;
        self.samples_in += 1;

        // Analytic pair for input index t - hilbert_mid. Indices before the
        // start of the stream are zero, as in the offline convolution.
        let q = self.hilbert.push(x);
        let i = self.in_phase.process(x);
        let (i, q) = if t < self.hilbert_mid { (0.0, 0.0) } else { (i, q) };

        let (di, dq) = rotate(i, q, self.down_phase, ShiftDirection::Down);
        self.down_phase = wrap(self.down_phase + self.shift);

        let bi = self.lowpass_i.push(di);
        let bq = self.lowpass_q.push(dq);
        let (ui, uq) = rotate(bi, bq, self.up_phase, ShiftDirection::Up);
        self.up_phase = wrap(self.up_phase + self.shift);

        // Index of the band-filtered sample just produced.
        let settle = self.hilbert_mid + self.lowpass_mid;
        if t < settle {
            return 0.0;
        }
        let first = t == settle;

        let freq = if first {
            0.0
        } else {
            fm_step(self.prev_band.0, self.prev_band.1, ui, uq)
        };
        let envelope = (ui * ui + uq * uq).sqrt();
        self.prev_band = (ui, uq);

        let previous = self.held.replace(Held { freq, envelope });
        let raw = match previous {
            None => return 0.0,
            Some(held) => {
                // Sample 0 has no backward difference and borrows sample 1's.
                let f = if t == settle + 1 { freq } else { held.freq };
                self.synthesizer
                    .render_sample(&mut self.phase, f, held.envelope)
            }
        };

        self.running_peak = self.running_peak.max(raw.abs());
        if self.running_peak > 0.0 {
            raw * self.output_peak / self.running_peak
        } else {
            0.0
        }
    }
}

#[inline]
fn wrap(phase: f64) -> f64 {
    phase.rem_euclid(TWO_PI)
}
