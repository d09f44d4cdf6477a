//! recipe-miner - toolchain recipes mined from arduino-cli build logs
//!
//! arduino-cli hides the compiler, archiver and linker invocations it uses for
//! a board behind its own build system. This library compiles a throwaway
//! probe sketch in verbose mode and reverse-engineers those invocations from
//! the captured log, so an external build system can reuse the same toolchain.
//!
//! # Core Concepts
//!
//! - **Probe sketch**: one empty source per kind (`.S`, `.c`, `.cpp`, `.ino`)
//!   whose file names make every compile line identifiable
//! - **Stages**: slices of the log delimited by arduino-cli's `...` announcements
//! - **Recipes**: a tool plus its partitioned arguments (flags, include paths,
//!   objects, libraries)
//!
//! # Example Usage
//!
//! ```no_run
//! use recipe_miner::mining::{mine, parse_stages, AnyTool, SourceMap};
//! use std::path::Path;
//!
//! let log = std::fs::read_to_string("build.log").unwrap();
//! let sources = SourceMap::new(Path::new("sketch_probe1"), "sketch_probe1");
//! let stages = parse_stages(&log, &AnyTool);
//! let report = mine(&stages, &sources).unwrap();
//! println!("Linker: {}", report.link.linker);
//! ```
//!
//! # Project Structure
//!
//! - [`mining`]: log segmentation, token filters and recipe extraction
//! - [`sketch`]: probe sketch generation and the arduino-cli probe build
//! - [`cli`]: command-line interface and output formatting

pub mod cli;
pub mod config;
pub mod mining;
pub mod sketch;
pub mod util;

pub use config::{ConfigError, MinerConfig};
pub use mining::{mine, parse_stages, MinerError, MiningReport, Source, SourceMap, Stage};
pub use sketch::{make_sketch, probe_build, ArduinoCli, BuildError};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
