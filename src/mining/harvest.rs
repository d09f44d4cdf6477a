//! Marker-bounded harvest of compile and link commands
//!
//! Works directly on the raw log lines between fixed arduino-cli markers rather
//! than on parsed stages. It feeds the CMake record, which only needs the full
//! compile command per source kind and the linker command.

use super::error::{MinerError, Result};
use super::stages::lines_between;
use super::tokenize::split_line;
use super::types::{Source, SourceMap};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

const COMPILATION_START: &str = "Compiling sketch...";
const COMPILATION_END: &str = "Compiling libraries...";
const LINK_START: &str = "Linking everything together...";

/// Source kinds the CMake record describes, in record order
pub const HARVESTED_SOURCES: [Source; 3] = [Source::S, Source::C, Source::Cpp];

/// The link line reduced to the linker and its flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkerCommand {
    pub core_archive: PathBuf,
    /// Linker followed by its flags
    pub command: Vec<String>,
}

/// Compile command (tool followed by flags) for each of S, c and cpp.
///
/// Every command is cross-checked against arduino-cli's fixed argument
/// layout `<tool> -c <flags...> <input> -o <output>`; a mismatch means the
/// output format changed and is reported rather than trusted.
pub fn compilation_commands(
    lines: &[String],
    sources: &SourceMap,
) -> Result<BTreeMap<Source, Vec<String>>> {
    let compilation_lines = lines_between(lines, COMPILATION_START, Some(COMPILATION_END))?;

    let mut commands = BTreeMap::new();
    for source in HARVESTED_SOURCES {
        let filename = sources.file_name(source);
        let object = format!("{}.o", filename);

        let line = compilation_lines
            .iter()
            .find(|line| line.contains(&object))
            .ok_or(MinerError::MissingInvocation(source))?;
        let tokens = split_line(line)?;

        let necessary: Vec<String> = tokens
            .iter()
            .filter(|token| {
                token.as_str() != "-o"
                    && token.as_str() != "-c"
                    && !token.ends_with(&filename)
                    && !token.ends_with(&object)
            })
            .cloned()
            .collect();

        let middle = tokens
            .get(2..tokens.len().saturating_sub(3))
            .unwrap_or_default();
        let expected: Vec<String> = tokens.iter().take(1).chain(middle).cloned().collect();
        if necessary != expected {
            return Err(MinerError::shape(
                "compile line",
                format!(
                    "necessary arguments are usually all but the last 3:\n\t{:?}\n\t{:?}",
                    necessary, expected
                ),
            ));
        }

        debug!("Compile command for *.{}: {}", source, necessary.join(" "));
        commands.insert(source, necessary);
    }
    Ok(commands)
}

/// Linker command and core archive from the first line of the link stage
pub fn linker_command(lines: &[String]) -> Result<LinkerCommand> {
    let link_line = lines_between(lines, LINK_START, None)?
        .first()
        .ok_or_else(|| MinerError::shape("link stage", "failed to find linking lines"))?;
    let tokens = split_line(link_line)?;

    let core_archive = tokens
        .iter()
        .find(|token| token.ends_with("core.a"))
        .map(PathBuf::from)
        .ok_or_else(|| MinerError::shape("link line", "failed to find core in linking line"))?;
    let build_directory = core_archive
        .parent()
        .and_then(|parent| parent.parent())
        .map(|directory| directory.to_string_lossy().into_owned())
        .unwrap_or_default();

    let command = tokens
        .into_iter()
        .filter(|token| {
            token != "-o"
                && !token.ends_with("ino.elf")
                && !token.ends_with(".o")
                && !token.ends_with("core.a")
                && (build_directory.is_empty() || !token.ends_with(&build_directory))
        })
        .collect();

    Ok(LinkerCommand {
        core_archive,
        command,
    })
}
