//! Output formatting for mining results
//!
//! A [`MiningReport`] renders as JSON, YAML or human-readable text. The CMake
//! record has its own fixed `;`-terminated layout consumed by the toolchain
//! file, see [`cmake_record`].
//!
//! # Example
//!
//! ```ignore
//! use recipe_miner::cli::output::{OutputFormat, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! let output = formatter.format(&report)?;
//! println!("{}", output);
//! ```

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

use crate::mining::harvest::{LinkerCommand, HARVESTED_SOURCES};
use crate::mining::{MiningReport, Source};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// Output formatter for mining reports
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a mining report according to the configured format
    pub fn format(&self, report: &MiningReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .context("Failed to serialize mining report to JSON"),
            OutputFormat::Yaml => {
                serde_yaml::to_string(report).context("Failed to serialize mining report to YAML")
            }
            OutputFormat::Human => Ok(self.format_human(report)),
        }
    }

    fn format_human(&self, report: &MiningReport) -> String {
        let mut output = String::new();

        output.push_str("\u{2713} Arduino Toolchain Recipes\n");
        output.push_str(RULE);
        output.push_str("\n\n");

        output.push_str(&format!(
            "Sketch Cache:  {}\n\n",
            report.sketch_cache.display()
        ));

        output.push_str("Archive:\n");
        output.push_str(&format!(
            "\u{251C}\u{2500} Archiver: {}\n",
            report.archive.archiver
        ));
        output.push_str(&format!(
            "\u{2514}\u{2500} Flags:    {}\n\n",
            joined_or_none(&report.archive.flags)
        ));

        for (source, recipe) in &report.compile {
            output.push_str(&format!("Compile *.{}:\n", source));
            output.push_str(&format!("\u{251C}\u{2500} Tool:     {}\n", recipe.tool));
            output.push_str(&format!(
                "\u{251C}\u{2500} Flags:    {}\n",
                joined_or_none(&recipe.flags)
            ));
            if recipe.include_paths.is_empty() {
                output.push_str("\u{2514}\u{2500} Includes: (none)\n");
            } else {
                output.push_str("\u{2514}\u{2500} Includes:\n");
                for path in &recipe.include_paths {
                    output.push_str(&format!("   \u{2500} {}\n", path));
                }
            }
            output.push('\n');
        }

        output.push_str("Link:\n");
        output.push_str(&format!("\u{251C}\u{2500} Linker:    {}\n", report.link.linker));
        output.push_str(&format!(
            "\u{251C}\u{2500} Flags:     {}\n",
            joined_or_none(&report.link.flags)
        ));
        output.push_str(&format!(
            "\u{251C}\u{2500} Objects:   {}\n",
            joined_or_none(&report.link.objects)
        ));
        output.push_str(&format!(
            "\u{2514}\u{2500} Libraries: {}\n",
            joined_or_none(&report.link.libraries)
        ));

        if !report.post_link.is_empty() {
            output.push_str("\nPost-link Steps:\n");
            for step in &report.post_link {
                output.push_str(&format!("  - {}\n", step));
            }
        }

        output
    }
}

fn joined_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(" ")
    }
}

/// Renders the `;`-terminated record read by the CMake toolchain file.
///
/// Layout: archive, then tool and `|`-joined flags for S, c and cpp, then the
/// linker and its `|`-joined flags.
pub fn cmake_record(
    archive: &Path,
    commands: &BTreeMap<Source, Vec<String>>,
    linker: &LinkerCommand,
) -> Result<String> {
    let mut record = format!("{};", archive.display());
    for source in HARVESTED_SOURCES {
        let command = commands
            .get(&source)
            .with_context(|| format!("No compile command harvested for *.{}", source))?;
        push_command(&mut record, command);
    }
    push_command(&mut record, &linker.command);
    Ok(record)
}

fn push_command(record: &mut String, command: &[String]) {
    let (tool, flags) = command.split_first().map_or(("", &[][..]), |(tool, flags)| {
        (tool.as_str(), flags)
    });
    record.push_str(tool);
    record.push(';');
    record.push_str(&flags.join("|"));
    record.push(';');
}
