//! Config command implementation
//!
//! Prints the effective codec configuration as JSON: the defaults, merged
//! with a config file and flag overrides when given.

use anyhow::Result;
use std::process::ExitCode;

use crate::settings::{self, ConfigOverrides};

/// Run the config command
pub fn run(overrides: &ConfigOverrides) -> Result<ExitCode> {
    println!("{}", render(overrides)?);
    Ok(ExitCode::SUCCESS)
}

/// Effective configuration as pretty JSON.
pub fn render(overrides: &ConfigOverrides) -> Result<String> {
    Ok(settings::resolve(overrides, None)?.to_json_pretty())
}
