//! Shared fixtures for integration tests
#![allow(dead_code)]

use recipe_miner::mining::{parse_stages, BuildStages, SourceMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Sketch directory name the fixture log was captured with
pub const SKETCH_NAME: &str = "sketch_probe1";

/// Installation prefix of every tool in the fixture log
pub const TOOL_PREFIX: &str = "/home/dev/.arduino15/";

/// Build directory arduino-cli used for the fixture log
pub const BUILD_DIR: &str = "/tmp/arduino/sketches/ABC123";

pub const AVR_BIN: &str =
    "/home/dev/.arduino15/packages/arduino/tools/avr-gcc/7.3.0-atmel3.6.1-arduino7/bin";

pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn uno_log() -> String {
    fs::read_to_string(fixture_path("arduino_avr_uno.log")).expect("Failed to read fixture log")
}

pub fn probe_sources() -> SourceMap {
    SourceMap::new(Path::new(SKETCH_NAME), SKETCH_NAME)
}

/// Stages of the fixture log, recognising tools by their install prefix
pub fn uno_stages() -> BuildStages {
    parse_stages(&uno_log(), &|program: &str| program.starts_with(TOOL_PREFIX))
}
