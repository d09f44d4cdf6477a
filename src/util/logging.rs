//! Structured logging setup for recipe-miner
//!
//! Logging uses the `tracing` ecosystem and always writes to standard error:
//! standard output is reserved for the mined record.
//!
//! # Example
//!
//! ```no_run
//! use recipe_miner::util::logging::{init_logging, parse_level, LoggingConfig};
//!
//! init_logging(LoggingConfig {
//!     level: parse_level("debug"),
//!     ..Default::default()
//! });
//!
//! tracing::debug!(board = "arduino:avr:uno", "Starting probe build");
//! ```

use std::env;
use std::io;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level to display
    pub level: Level,

    /// Emit JSON lines instead of human-readable text
    pub use_json: bool,

    /// Include the module target (e.g., recipe_miner::mining::stages) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

/// Parses a log level from a string, falling back to `INFO`
///
/// ```
/// use recipe_miner::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("INFO"), Level::INFO);
/// assert_eq!(parse_level("invalid"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Picks the effective level from command-line switches.
///
/// An explicit level wins over `verbose`, which wins over `quiet`; otherwise
/// `fallback` (usually the configured level) applies.
pub fn resolve_level(explicit: Option<&str>, verbose: bool, quiet: bool, fallback: &str) -> Level {
    if let Some(level) = explicit {
        parse_level(level)
    } else if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        parse_level(fallback)
    }
}

/// Initializes the logging system with the provided configuration.
///
/// Only the first call has an effect. `RUST_LOG` directives are honoured on
/// top of the configured level.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            if let Ok(directive) = format!("recipe_miner={}", config.level).parse() {
                filter = filter.add_directive(directive);
            }
        }

        let layer = fmt::layer()
            .with_writer(io::stderr)
            .with_target(config.include_target)
            .with_file(config.include_location)
            .with_line_number(config.include_location);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(layer.json())
                .init();
        } else {
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    });
}
