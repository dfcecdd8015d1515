//! Inspect command implementation
//!
//! Measures a WAV file and reports which side channel, if any, it carries.
//! Nothing is decoded or written.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

use warbler_codec::analysis::dominant_frequency_hz;
use warbler_codec::normalize::{peak, rms};
use warbler_codec::{Decoder, SampleBuffer, StrategyKind};

use super::json_output::{to_json_string, InspectOutput, JsonError, SignalMetrics};
use crate::settings::{self, ConfigOverrides};
use crate::wav;

/// Run the inspect command
///
/// # Arguments
/// * `input` - WAV file to inspect
/// * `overrides` - Configuration overrides for the detectors
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on error
pub fn run(input: &str, overrides: &ConfigOverrides, json_output: bool) -> Result<ExitCode> {
    if json_output {
        let mut result = InspectOutput {
            input: input.to_string(),
            ..Default::default()
        };
        let code = match inspect_file(input, overrides) {
            Ok((detected, metrics)) => {
                result.success = true;
                result.detected = detected.map(|k| k.to_string());
                result.metrics = Some(metrics);
                ExitCode::SUCCESS
            }
            Err(e) => {
                result.errors.push(JsonError::from_anyhow(&e));
                ExitCode::from(1)
            }
        };
        println!("{}", to_json_string(&result));
        return Ok(code);
    }

    let (detected, metrics) = inspect_file(input, overrides)?;

    println!("{} {}", "Inspecting".cyan().bold(), input);
    println!(
        "  {} {} ch, {} Hz, {:.3} s",
        "Format:".dimmed(),
        metrics.channels,
        metrics.sample_rate,
        metrics.duration_seconds
    );
    println!("  {} {:.4}", "Peak:".dimmed(), metrics.peak);
    println!("  {} {:.4}", "RMS:".dimmed(), metrics.rms);
    println!(
        "  {} {:.1} Hz",
        "Dominant frequency:".dimmed(),
        metrics.dominant_frequency_hz
    );
    if let Some(second) = metrics.second_channel_rms {
        println!("  {} {:.6}", "Second channel RMS:".dimmed(), second);
    }
    match detected {
        Some(kind) => println!("  {} {}", "Side channel:".dimmed(), kind.to_string().green()),
        None => println!("  {} {}", "Side channel:".dimmed(), "none detected".yellow()),
    }

    Ok(ExitCode::SUCCESS)
}

/// Measures the first channel and runs detection.
pub fn inspect_file(
    input: &str,
    overrides: &ConfigOverrides,
) -> Result<(Option<StrategyKind>, SignalMetrics)> {
    let buffer = wav::read_wav(Path::new(input))?;
    let config = settings::resolve(overrides, Some(buffer.sample_rate()))?;
    let detected = Decoder::new(config)?.detect(&buffer)?;
    Ok((detected, measure(&buffer)))
}

/// Level and pitch measurements of a buffer.
pub fn measure(buffer: &SampleBuffer) -> SignalMetrics {
    let primary = buffer.primary();
    SignalMetrics {
        channels: buffer.channel_count(),
        sample_rate: buffer.sample_rate(),
        duration_seconds: buffer.duration_seconds(),
        peak: peak(primary),
        rms: rms(primary),
        dominant_frequency_hz: dominant_frequency_hz(primary, buffer.sample_rate()),
        second_channel_rms: buffer.channel(1).map(rms),
    }
}
