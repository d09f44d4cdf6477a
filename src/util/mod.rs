//! Utility modules for recipe-miner
//!
//! - Structured logging setup and configuration
//! - Text rendering for diagnostics

pub mod logging;
pub mod text;

pub use logging::{init_logging, LoggingConfig};
