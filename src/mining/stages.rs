//! Segmentation of a captured build log into stages and identification of
//! the command lines inside them

use super::error::{MinerError, Result};
use super::filter::PatternSet;
use super::tokenize::split_line_lenient;
use super::types::Stage;
use crate::util::text::string_dictionary_of_list;
use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::path::Path;
use tracing::{debug, warn};

/// Suffix arduino-cli gives every section announcement
const ANNOUNCEMENT_SUFFIX: &str = "...";

/// Decides whether the first token of a log line names an executable tool
pub trait ToolLocator {
    fn is_tool(&self, program: &str) -> bool;
}

impl<F> ToolLocator for F
where
    F: Fn(&str) -> bool,
{
    fn is_tool(&self, program: &str) -> bool {
        self(program)
    }
}

/// Treats every tokenizable line as an invocation
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyTool;

impl ToolLocator for AnyTool {
    fn is_tool(&self, _program: &str) -> bool {
        true
    }
}

/// Resolves programs the way a shell would: paths directly, bare names on `PATH`
#[derive(Debug, Clone)]
pub struct SearchPath {
    search_path: Option<OsString>,
}

impl Default for SearchPath {
    fn default() -> Self {
        Self {
            search_path: env::var_os("PATH"),
        }
    }
}

impl SearchPath {
    pub fn with_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

impl ToolLocator for SearchPath {
    fn is_tool(&self, program: &str) -> bool {
        let candidate = Path::new(program);
        if candidate.components().count() > 1 {
            return is_executable(candidate);
        }
        match &self.search_path {
            Some(search_path) => env::split_paths(search_path)
                .any(|directory| is_executable(&directory.join(program))),
            None => false,
        }
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Invocation lines of a build log grouped by stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStages {
    stages: BTreeMap<Stage, Vec<String>>,
}

impl BuildStages {
    /// Lines recorded for `stage`, empty when the stage never ran
    pub fn lines(&self, stage: Stage) -> &[String] {
        self.stages.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Appends lines to a stage
    pub fn insert(&mut self, stage: Stage, lines: Vec<String>) {
        self.stages.entry(stage).or_default().extend(lines);
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.stages.contains_key(&stage)
    }

    pub fn as_map(&self) -> &BTreeMap<Stage, Vec<String>> {
        &self.stages
    }
}

impl FromIterator<(Stage, Vec<String>)> for BuildStages {
    fn from_iter<I: IntoIterator<Item = (Stage, Vec<String>)>>(iter: I) -> Self {
        let mut stages = BuildStages::default();
        for (stage, lines) in iter {
            stages.insert(stage, lines);
        }
        stages
    }
}

/// Splits raw output into trimmed lines
pub fn log_lines(stdout: &str) -> Vec<String> {
    stdout.lines().map(|line| line.trim().to_string()).collect()
}

/// Splits output into `(announcement, lines)` sections in log order.
///
/// An announcement is any line ending in `...`; its section runs up to the
/// next announcement or the end of the log. Lines before the first
/// announcement belong to no section.
pub fn sectioner(stdout: &str) -> Vec<(String, Vec<String>)> {
    let lines = log_lines(stdout);
    let titles: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.ends_with(ANNOUNCEMENT_SUFFIX))
        .map(|(index, _)| index)
        .collect();

    titles
        .iter()
        .enumerate()
        .map(|(position, &start)| {
            let end = titles.get(position + 1).copied().unwrap_or(lines.len());
            (lines[start].clone(), lines[start + 1..end].to_vec())
        })
        .collect()
}

/// Reduces lines to real tool invocations
pub fn invocation_filter(lines: &[String], locator: &dyn ToolLocator) -> Vec<String> {
    lines
        .iter()
        .filter(|line| {
            split_line_lenient(line)
                .first()
                .map(|program| locator.is_tool(program))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Parses arduino-cli output into stage-annotated invocation lines
pub fn parse_stages(stdout: &str, locator: &dyn ToolLocator) -> BuildStages {
    let mut stages = BuildStages::default();
    let mut unknown = Vec::new();

    for (title, lines) in sectioner(stdout) {
        let stage = Stage::from_announcement(&title);
        if stage == Stage::Unknown {
            unknown.push(title);
        }
        stages.insert(stage, invocation_filter(&lines, locator));
    }

    if !unknown.is_empty() {
        warn!("Unknown sections detected with titles: {}", unknown.join(","));
    }
    debug!(
        "Detected build stages:{}",
        string_dictionary_of_list(stages.as_map(), 1)
    );
    stages
}

/// Lines strictly between the first `start_phrase` and the first following
/// `end_phrase`, or up to the end of the log when no end phrase is given.
///
/// Markers are matched against whole lines. A missing marker is reported as
/// the stage it announces.
pub fn lines_between<'a>(
    lines: &'a [String],
    start_phrase: &str,
    end_phrase: Option<&str>,
) -> Result<&'a [String]> {
    let missing = |phrase: &str| MinerError::MissingStage(Stage::from_announcement(phrase));

    let start = lines
        .iter()
        .position(|line| line == start_phrase)
        .ok_or_else(|| missing(start_phrase))?
        + 1;
    let end = match end_phrase {
        Some(phrase) => {
            start
                + lines[start..]
                    .iter()
                    .position(|line| line == phrase)
                    .ok_or_else(|| missing(phrase))?
        }
        None => lines.len(),
    };
    Ok(&lines[start..end])
}

/// Finds the line of `stage` matching every pattern of `matcher`.
///
/// With `single`, more than one match is an ambiguity error; otherwise the
/// first match is returned.
pub fn identify_line<'a>(
    stage: Stage,
    stages: &'a BuildStages,
    matcher: &PatternSet,
    single: bool,
) -> Result<&'a str> {
    let matching: Vec<&'a str> = stages
        .lines(stage)
        .iter()
        .map(String::as_str)
        .filter(|line| matcher.matches_all(line))
        .collect();

    match matching.as_slice() {
        [] => Err(MinerError::MissingStage(stage)),
        [first, ..] if !single || matching.len() == 1 => Ok(*first),
        _ => {
            let candidates: Vec<String> = matching.iter().map(|line| line.to_string()).collect();
            warn!(
                "Ambiguous invocations in {} stage:\n\t{}",
                stage,
                candidates.join("\n\t")
            );
            Err(MinerError::AmbiguousInvocation { stage, candidates })
        }
    }
}
