//! Configuration management for recipe-miner
//!
//! Settings are read from environment variables with sensible defaults;
//! command-line flags override them.
//!
//! # Environment Variables
//!
//! - `RECIPE_MINER_ARDUINO_CLI`: program used for the probe build - default: "arduino-cli"
//! - `RECIPE_MINER_LOG_LEVEL`: logging level - default: "info"
//! - `RECIPE_MINER_LOG_JSON`: emit JSON log lines (true|false) - default: "false"
//!
//! # Example
//!
//! ```no_run
//! use recipe_miner::MinerConfig;
//!
//! let config = MinerConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("Probing with {}", config.arduino_cli.display());
//! ```

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_ARDUINO_CLI: &str = "arduino-cli";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Runtime settings for a mining run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinerConfig {
    /// arduino-cli executable invoked for the probe build
    pub arduino_cli: PathBuf,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for MinerConfig {
    /// Loads `RECIPE_MINER_*` environment variables, falling back to defaults
    fn default() -> Self {
        let arduino_cli = env::var_os("RECIPE_MINER_ARDUINO_CLI")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARDUINO_CLI));

        let log_level = env::var("RECIPE_MINER_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let log_json = env::var("RECIPE_MINER_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            arduino_cli,
            log_level,
            log_json,
        }
    }
}

impl MinerConfig {
    /// Replaces the arduino-cli program when one is given
    pub fn with_arduino_cli(mut self, arduino_cli: Option<PathBuf>) -> Self {
        if let Some(arduino_cli) = arduino_cli {
            self.arduino_cli = arduino_cli;
        }
        self
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the arduino-cli program is empty or the log
    /// level is unknown
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.arduino_cli.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "arduino-cli program must not be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Key/value view used for debug output
    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(
            "arduino_cli".to_string(),
            self.arduino_cli.display().to_string(),
        );
        map.insert("log_level".to_string(), self.log_level.clone());
        map.insert("log_json".to_string(), self.log_json.to_string());
        map
    }
}
