//! Log output for the CLI.
//!
//! Codec events go to stderr so that `--json` reports on stdout stay
//! machine-readable.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Parses a level name, falling back to WARN for anything unknown.
pub fn parse_level(log_level: &str) -> Level {
    log_level.parse::<Level>().unwrap_or(Level::WARN)
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(log_level: &str) {
    let _ = FmtSubscriber::builder()
        .with_target(false)
        .with_max_level(parse_level(log_level))
        .with_writer(std::io::stderr)
        .try_init();
}
