//! Encode command implementation
//!
//! Reads a voice recording, disguises it as birdsong and writes the result.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

use warbler_codec::{Encoder, StrategyKind};

use super::json_output::{to_json_string, AudioInfo, EncodeOutput, JsonError};
use crate::settings::{self, ConfigOverrides};
use crate::wav::{self, WavSummary};

/// What an encode produced.
#[derive(Debug, Clone)]
pub struct EncodeReport {
    /// Strategy used
    pub strategy: StrategyKind,
    /// Ratio between carrier and voice fundamentals
    pub pitch_ratio: f64,
    /// Written file
    pub summary: WavSummary,
}

/// Run the encode command
///
/// # Arguments
/// * `input` - Voice WAV to read
/// * `output` - Birdsong WAV to write
/// * `overrides` - Configuration file and flag overrides
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(
    input: &str,
    output: &str,
    overrides: &ConfigOverrides,
    json_output: bool,
) -> Result<ExitCode> {
    if json_output {
        return Ok(run_json(input, output, overrides));
    }

    println!("{} {}", "Encoding".cyan().bold(), input);
    let report = encode_file(input, output, overrides)?;

    println!("  {} {}", "Strategy:".dimmed(), report.strategy);
    println!("  {} {:.3}", "Pitch ratio:".dimmed(), report.pitch_ratio);
    println!(
        "  {} {} ({} ch, {} Hz, {} samples)",
        "Wrote:".dimmed(),
        output,
        report.summary.channels,
        report.summary.sample_rate,
        report.summary.num_samples
    );
    println!("  {} {}", "PCM hash:".dimmed(), &report.summary.pcm_hash[..16]);
    println!("{}", "Done.".green().bold());

    Ok(ExitCode::SUCCESS)
}

fn run_json(input: &str, output: &str, overrides: &ConfigOverrides) -> ExitCode {
    let mut result = EncodeOutput {
        input: input.to_string(),
        output: output.to_string(),
        ..Default::default()
    };

    let code = match encode_file(input, output, overrides) {
        Ok(report) => {
            result.success = true;
            result.strategy = Some(report.strategy.to_string());
            result.pitch_ratio = Some(report.pitch_ratio);
            result.audio = Some(AudioInfo::from(&report.summary));
            ExitCode::SUCCESS
        }
        Err(e) => {
            result.errors.push(JsonError::from_anyhow(&e));
            ExitCode::from(1)
        }
    };

    println!("{}", to_json_string(&result));
    code
}

/// Reads, encodes and writes one file.
pub fn encode_file(input: &str, output: &str, overrides: &ConfigOverrides) -> Result<EncodeReport> {
    let voice = wav::read_wav(Path::new(input))?;
    let config = settings::resolve(overrides, Some(voice.sample_rate()))?;

    let encoded = Encoder::new(config)?.encode(&voice)?;
    let summary = wav::write_wav(Path::new(output), &encoded.buffer)?;

    Ok(EncodeReport {
        strategy: encoded.strategy,
        pitch_ratio: encoded.pitch_ratio,
        summary,
    })
}
