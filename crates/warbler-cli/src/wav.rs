//! WAV file reading and writing.
//!
//! Reading accepts integer PCM of any bit depth up to 32 and 32-bit float,
//! mono or interleaved stereo. Writing always produces 16-bit integer PCM.

use anyhow::{bail, Context, Result};
use std::io::Read;
use std::path::Path;

use warbler_codec::SampleBuffer;

/// What was written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavSummary {
    /// BLAKE3 hash of the PCM data (not the full WAV file).
    pub pcm_hash: String,
    /// Number of channels.
    pub channels: usize,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of samples per channel.
    pub num_samples: usize,
}

/// Reads a WAV file into a sample buffer.
pub fn read_wav(path: &Path) -> Result<SampleBuffer> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;
    read_samples(reader).with_context(|| format!("Failed to read WAV file: {}", path.display()))
}

fn read_samples<R: Read>(reader: hound::WavReader<R>) -> Result<SampleBuffer> {
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 || channels > 2 {
        bail!("Unsupported channel count {} (expected 1 or 2)", channels);
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                bail!("Unsupported bit depth: {} bits", spec.bits_per_sample);
            }
            let full_scale = (1u64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f64 / full_scale))
                .collect::<Result<_, _>>()
                .context("Failed to decode integer samples")?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()
            .context("Failed to decode float samples")?,
    };

    Ok(SampleBuffer::from_interleaved(
        &interleaved,
        channels,
        spec.sample_rate,
    )?)
}

#[inline]
fn to_pcm16(sample: f64) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

/// Interleaved little-endian 16-bit PCM bytes for a buffer.
pub fn pcm16_bytes(buffer: &SampleBuffer) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(buffer.len() * buffer.channel_count() * 2);
    for sample in buffer.interleave() {
        pcm.extend_from_slice(&to_pcm16(sample).to_le_bytes());
    }
    pcm
}

/// BLAKE3 hash of the 16-bit PCM a buffer is written as.
pub fn pcm_hash(buffer: &SampleBuffer) -> String {
    blake3::hash(&pcm16_bytes(buffer)).to_hex().to_string()
}

/// Writes a buffer as 16-bit PCM.
pub fn write_wav(path: &Path, buffer: &SampleBuffer) -> Result<WavSummary> {
    let spec = hound::WavSpec {
        channels: buffer.channel_count() as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
    for sample in buffer.interleave() {
        writer
            .write_sample(to_pcm16(sample))
            .with_context(|| format!("Failed to write WAV file: {}", path.display()))?;
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file: {}", path.display()))?;

    Ok(WavSummary {
        pcm_hash: pcm_hash(buffer),
        channels: buffer.channel_count(),
        sample_rate: buffer.sample_rate(),
        num_samples: buffer.len(),
    })
}
