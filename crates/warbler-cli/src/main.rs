//! Warbler CLI - disguise speech as birdsong and recover it
//!
//! This binary wraps the codec with WAV file handling: encode a voice
//! recording, decode a birdsong file, inspect a file for side channels, and
//! write reference signals.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use warbler_cli::commands;
use warbler_cli::commands::signal::{NoiseParams, SweepParams};
use warbler_cli::logging;
use warbler_cli::settings::ConfigOverrides;

/// Warbler - Voice-to-Birdsong Codec
#[derive(Parser)]
#[command(name = "warbler")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log level for codec diagnostics (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a voice recording as birdsong
    Encode {
        /// Path to the voice WAV file
        #[arg(short, long)]
        input: String,

        /// Path of the birdsong WAV file to write
        #[arg(short, long)]
        output: String,

        #[command(flatten)]
        codec: ConfigOverrides,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Recover the voice from a birdsong file (exit code 2 if none is found)
    Decode {
        /// Path to the birdsong WAV file
        #[arg(short, long)]
        input: String,

        /// Path of the voice WAV file to write
        #[arg(short, long)]
        output: String,

        #[command(flatten)]
        codec: ConfigOverrides,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Measure a WAV file and report which side channel it carries
    Inspect {
        /// Path to the WAV file
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        codec: ConfigOverrides,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Write a linear frequency sweep (a voice-like test signal)
    Sweep {
        /// Path of the WAV file to write
        #[arg(short, long)]
        output: String,

        /// Start frequency in Hz
        #[arg(long, default_value_t = 200.0)]
        start: f64,

        /// End frequency in Hz
        #[arg(long, default_value_t = 800.0)]
        end: f64,

        /// Duration in seconds
        #[arg(long, default_value_t = 1.0)]
        seconds: f64,

        /// Sample rate in Hz
        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,

        /// Peak amplitude
        #[arg(long, default_value_t = 0.8)]
        amplitude: f64,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Write seeded band-limited noise
    Noise {
        /// Path of the WAV file to write
        #[arg(short, long)]
        output: String,

        /// RNG seed
        #[arg(long, default_value_t = 0)]
        seed: u32,

        /// Duration in seconds
        #[arg(long, default_value_t = 1.0)]
        seconds: f64,

        /// Sample rate in Hz
        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,

        /// Upper band edge in Hz
        #[arg(long, default_value_t = 3000.0)]
        cutoff: f64,

        /// Peak amplitude
        #[arg(long, default_value_t = 0.8)]
        amplitude: f64,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Print the effective codec configuration as JSON
    Config {
        #[command(flatten)]
        codec: ConfigOverrides,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Encode {
            input,
            output,
            codec,
            json,
        } => commands::encode::run(&input, &output, &codec, json),
        Commands::Decode {
            input,
            output,
            codec,
            json,
        } => commands::decode::run(&input, &output, &codec, json),
        Commands::Inspect { input, codec, json } => commands::inspect::run(&input, &codec, json),
        Commands::Sweep {
            output,
            start,
            end,
            seconds,
            sample_rate,
            amplitude,
            json,
        } => commands::signal::run_sweep(
            &output,
            &SweepParams {
                start_hz: start,
                end_hz: end,
                seconds,
                sample_rate,
                amplitude,
            },
            json,
        ),
        Commands::Noise {
            output,
            seed,
            seconds,
            sample_rate,
            cutoff,
            amplitude,
            json,
        } => commands::signal::run_noise(
            &output,
            &NoiseParams {
                seed,
                seconds,
                sample_rate,
                cutoff_hz: cutoff,
                amplitude,
            },
            json,
        ),
        Commands::Config { codec } => commands::config::run(&codec),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
