//! Reference signal commands (`sweep`, `noise`)
//!
//! Writes deterministic voice-like test signals for trying out the codec.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

use warbler_codec::testsignal::{linear_sweep, noise_burst};
use warbler_codec::SampleBuffer;

use super::json_output::{to_json_string, AudioInfo, JsonError, SignalOutput};
use crate::wav::{self, WavSummary};

/// Parameters of a linear sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepParams {
    pub start_hz: f64,
    pub end_hz: f64,
    pub seconds: f64,
    pub sample_rate: u32,
    pub amplitude: f64,
}

/// Parameters of a band-limited noise burst.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseParams {
    pub seed: u32,
    pub seconds: f64,
    pub sample_rate: u32,
    pub cutoff_hz: f64,
    pub amplitude: f64,
}

/// Run the sweep command
pub fn run_sweep(output: &str, params: &SweepParams, json_output: bool) -> Result<ExitCode> {
    let result = write_sweep(output, params);
    report(output, "sweep", result, json_output)
}

/// Run the noise command
pub fn run_noise(output: &str, params: &NoiseParams, json_output: bool) -> Result<ExitCode> {
    let result = write_noise(output, params);
    report(output, "noise burst", result, json_output)
}

/// Writes a sweep to `output`.
pub fn write_sweep(output: &str, params: &SweepParams) -> Result<WavSummary> {
    let samples = linear_sweep(
        params.start_hz,
        params.end_hz,
        params.seconds,
        params.sample_rate,
        params.amplitude,
    );
    wav::write_wav(
        Path::new(output),
        &SampleBuffer::mono(samples, params.sample_rate),
    )
}

/// Writes a noise burst to `output`.
pub fn write_noise(output: &str, params: &NoiseParams) -> Result<WavSummary> {
    let samples = noise_burst(
        params.seed,
        params.seconds,
        params.sample_rate,
        params.cutoff_hz,
        params.amplitude,
    )?;
    wav::write_wav(
        Path::new(output),
        &SampleBuffer::mono(samples, params.sample_rate),
    )
}

fn report(
    output: &str,
    what: &str,
    result: Result<WavSummary>,
    json_output: bool,
) -> Result<ExitCode> {
    if json_output {
        let mut out = SignalOutput {
            output: output.to_string(),
            ..Default::default()
        };
        let code = match result {
            Ok(summary) => {
                out.success = true;
                out.audio = Some(AudioInfo::from(&summary));
                ExitCode::SUCCESS
            }
            Err(e) => {
                out.errors.push(JsonError::from_anyhow(&e));
                ExitCode::from(1)
            }
        };
        println!("{}", to_json_string(&out));
        return Ok(code);
    }

    let summary = result?;
    println!(
        "{} {} to {} ({} samples at {} Hz)",
        "Wrote".green().bold(),
        what,
        output,
        summary.num_samples,
        summary.sample_rate
    );
    Ok(ExitCode::SUCCESS)
}
