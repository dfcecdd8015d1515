//! Sample buffers exchanged with the outside world.
//!
//! A [`SampleBuffer`] holds one or two equal-length channels of `f64`
//! samples in [-1.0, 1.0] tagged with a sample rate. Pipeline stages never
//! mutate a buffer they were handed; they produce a new one.

use crate::error::{CodecError, CodecResult};

/// Planar audio buffer with one or two channels.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    channels: Vec<Vec<f64>>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Creates a mono buffer.
    pub fn mono(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            channels: vec![samples],
            sample_rate,
        }
    }

    /// Creates a stereo buffer. Both channels must have the same length.
    pub fn stereo(left: Vec<f64>, right: Vec<f64>, sample_rate: u32) -> CodecResult<Self> {
        if left.len() != right.len() {
            return Err(CodecError::LengthMismatch {
                what: "right channel",
                expected: left.len(),
                actual: right.len(),
            });
        }
        Ok(Self {
            channels: vec![left, right],
            sample_rate,
        })
    }

    /// Creates an empty buffer with the given channel count.
    pub fn empty(channel_count: usize, sample_rate: u32) -> CodecResult<Self> {
        check_channel_count(channel_count)?;
        Ok(Self {
            channels: vec![Vec::new(); channel_count],
            sample_rate,
        })
    }

    /// Splits interleaved samples into a planar buffer.
    pub fn from_interleaved(
        samples: &[f64],
        channel_count: usize,
        sample_rate: u32,
    ) -> CodecResult<Self> {
        check_channel_count(channel_count)?;
        if samples.len() % channel_count != 0 {
            return Err(CodecError::invalid_param(
                "samples",
                format!(
                    "{} interleaved samples do not divide into {} channels",
                    samples.len(),
                    channel_count
                ),
            ));
        }

        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Creates interleaved samples.
    pub fn interleave(&self) -> Vec<f64> {
        let mut output = Vec::with_capacity(self.len() * self.channel_count());
        for frame in 0..self.len() {
            for channel in &self.channels {
                output.push(channel[frame]);
            }
        }
        output
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels (1 or 2).
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Returns true for a two-channel buffer.
    pub fn is_stereo(&self) -> bool {
        self.channels.len() == 2
    }

    /// Samples of one channel, if it exists.
    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// The first channel. Mono pipelines read only this one.
    pub fn primary(&self) -> &[f64] {
        &self.channels[0]
    }

    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Consumes the buffer and returns its channels.
    pub fn into_channels(self) -> Vec<Vec<f64>> {
        self.channels
    }

    /// Returns a mono buffer holding only the first channel.
    ///
    /// Legacy stereo inputs carry the audible signal on channel 1, so this is
    /// a channel pick rather than an average.
    pub fn downmix(&self) -> SampleBuffer {
        SampleBuffer::mono(self.channels[0].clone(), self.sample_rate)
    }
}

fn check_channel_count(channel_count: usize) -> CodecResult<()> {
    if channel_count == 0 || channel_count > 2 {
        return Err(CodecError::ChannelCount {
            channels: channel_count,
        });
    }
    Ok(())
}
