//! Log mining engine
//!
//! Turns the verbose output of one arduino-cli probe build into structured
//! toolchain recipes. The engine is a pure function of the captured text and
//! the probe [`SourceMap`]:
//!
//! 1. [`stages`] segments the log into build stages and locates lines
//! 2. [`tokenize`] splits a line with shell quoting rules
//! 3. [`filter`] and [`sort`] partition the tokens
//! 4. [`recipes`] assembles compile, link and archive recipes
//!
//! [`harvest`] offers the simpler marker-bounded extraction used for the CMake
//! record.

pub mod error;
pub mod filter;
pub mod harvest;
pub mod recipes;
pub mod sort;
pub mod stages;
pub mod tokenize;
pub mod types;

pub use error::MinerError;
pub use recipes::{ArchiveRecipe, CompileRecipe, LinkRecipe};
pub use stages::{parse_stages, AnyTool, BuildStages, SearchPath, ToolLocator};
pub use types::{Source, SourceMap, Stage};

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Everything mined from one probe build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiningReport {
    pub sketch_cache: PathBuf,
    pub archive: ArchiveRecipe,
    pub compile: BTreeMap<Source, CompileRecipe>,
    pub link: LinkRecipe,
    pub post_link: Vec<String>,
}

/// Runs every extractor against the parsed stages
pub fn mine(stages: &BuildStages, sources: &SourceMap) -> error::Result<MiningReport> {
    Ok(MiningReport {
        sketch_cache: recipes::sketch_cache(stages)?,
        archive: recipes::archive_tokens(stages)?,
        compile: recipes::build_tokens(stages, sources)?,
        link: recipes::link_tokens(stages, sources)?,
        post_link: recipes::post_link_lines(stages, sources)?,
    })
}
