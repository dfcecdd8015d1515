//! Decode command implementation
//!
//! Recovers the voice from a birdsong file. The embedding strategy is
//! detected automatically unless `--strategy` forces one.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

use warbler_codec::{DecodeOutcome, Decoder, StrategyKind};

use super::json_output::{to_json_string, AudioInfo, DecodeOutput, JsonError};
use crate::settings::{self, ConfigOverrides};
use crate::wav::{self, WavSummary};

/// Exit code when the input carries no recoverable voice.
pub const EXIT_NO_VOICE: u8 = 2;

/// What a decode produced.
#[derive(Debug, Clone)]
pub enum DecodeReport {
    /// A voice was recovered and written.
    Recovered {
        /// Strategy that produced it (`none` for the DSP inversion)
        strategy: StrategyKind,
        /// Written file
        summary: WavSummary,
    },
    /// Nothing recoverable; no file was written.
    NoVoice {
        /// Strategies tried, in order
        attempted: Vec<StrategyKind>,
    },
}

/// Run the decode command
///
/// # Arguments
/// * `input` - Birdsong WAV to read
/// * `output` - Voice WAV to write
/// * `overrides` - Configuration; `strategy` here forces a single strategy
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 when recovered, 2 when no voice was found, 1 on error
pub fn run(
    input: &str,
    output: &str,
    overrides: &ConfigOverrides,
    json_output: bool,
) -> Result<ExitCode> {
    if json_output {
        return Ok(run_json(input, output, overrides));
    }

    println!("{} {}", "Decoding".cyan().bold(), input);
    match decode_file(input, output, overrides)? {
        DecodeReport::Recovered { strategy, summary } => {
            println!("  {} {}", "Strategy:".dimmed(), strategy);
            println!(
                "  {} {} ({} samples at {} Hz)",
                "Wrote:".dimmed(),
                output,
                summary.num_samples,
                summary.sample_rate
            );
            println!("  {} {}", "PCM hash:".dimmed(), &summary.pcm_hash[..16]);
            println!("{}", "Voice recovered.".green().bold());
            Ok(ExitCode::SUCCESS)
        }
        DecodeReport::NoVoice { attempted } => {
            let tried: Vec<&str> = attempted.iter().map(|k| k.name()).collect();
            println!("  {} {}", "Tried:".dimmed(), tried.join(", "));
            println!("{}", "No recoverable voice.".yellow().bold());
            Ok(ExitCode::from(EXIT_NO_VOICE))
        }
    }
}

fn run_json(input: &str, output: &str, overrides: &ConfigOverrides) -> ExitCode {
    let mut result = DecodeOutput {
        input: input.to_string(),
        output: output.to_string(),
        ..Default::default()
    };

    let code = match decode_file(input, output, overrides) {
        Ok(DecodeReport::Recovered { strategy, summary }) => {
            result.success = true;
            result.recovered = true;
            result.strategy = Some(strategy.to_string());
            result.audio = Some(AudioInfo::from(&summary));
            ExitCode::SUCCESS
        }
        Ok(DecodeReport::NoVoice { attempted }) => {
            result.success = true;
            result.attempted = attempted.iter().map(|k| k.to_string()).collect();
            ExitCode::from(EXIT_NO_VOICE)
        }
        Err(e) => {
            result.errors.push(JsonError::from_anyhow(&e));
            ExitCode::from(1)
        }
    };

    println!("{}", to_json_string(&result));
    code
}

/// Reads and decodes one file, writing the voice if one was recovered.
pub fn decode_file(input: &str, output: &str, overrides: &ConfigOverrides) -> Result<DecodeReport> {
    let bird = wav::read_wav(Path::new(input))?;

    // The forced strategy is a decode choice, not a config field: keep it
    // out of validation so that a mono file can still be forced through
    // any detector.
    let forced = overrides.strategy;
    let config_overrides = ConfigOverrides {
        strategy: None,
        ..overrides.clone()
    };
    let config = settings::resolve(&config_overrides, Some(bird.sample_rate()))?;
    let decoder = Decoder::new(config)?;

    let outcome = match forced {
        Some(kind) => decoder.decode_with(kind, &bird)?,
        None => decoder.decode(&bird)?,
    };

    Ok(match outcome {
        DecodeOutcome::Recovered { strategy, voice } => DecodeReport::Recovered {
            strategy,
            summary: wav::write_wav(Path::new(output), &voice)?,
        },
        DecodeOutcome::NoRecoverableVoice { attempted } => DecodeReport::NoVoice { attempted },
    })
}
