//! Probe sketch generation and the arduino-cli probe build
//!
//! arduino-cli only reveals its toolchain invocations while building a real
//! sketch. The probe sketch holds one empty source of every [`Source`] kind plus
//! a minimal entry point, and is compiled once in clean, verbose mode.

use crate::mining::{Source, SourceMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

const PROBE_PREFIX: &str = "sketch_probe";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to prepare probe sketch in {}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Sketch directory has no usable name: {}", .0.display())]
    InvalidSketchDirectory(PathBuf),

    #[error("Failed to run {}", .program.display())]
    Spawn { program: PathBuf, source: io::Error },

    #[error("arduino-cli failed with return code: {}\n\t{}", exit_code(.code), .stderr.lines().collect::<Vec<_>>().join("\n\t"))]
    ToolFailed { code: Option<i32>, stderr: String },
}

fn exit_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |code| code.to_string())
}

/// Captured output of a successful probe build
#[derive(Debug, Clone)]
pub struct ProbeBuild {
    pub sources: SourceMap,
    pub stdout: String,
    pub stderr: String,
}

/// Creates the probe sketch in `directory`.
///
/// Every source kind gets an empty `<dir-name>.<ext>` file; the entry point
/// includes the requested libraries and defines empty `setup`/`loop`.
pub fn make_sketch(directory: &Path, libraries: &[String]) -> Result<SourceMap, BuildError> {
    let sources = SourceMap::for_sketch_dir(directory)
        .ok_or_else(|| BuildError::InvalidSketchDirectory(directory.to_path_buf()))?;

    for (_, path) in sources.iter() {
        write_file(path, "")?;
    }

    let mut entry_point: String = libraries
        .iter()
        .map(|library| format!("#include <{}.h>\n", library))
        .collect();
    entry_point.push_str("void setup() {}\nvoid loop() {}\n");
    write_file(sources.path(Source::Ino), &entry_point)?;

    Ok(sources)
}

fn write_file(path: &Path, contents: &str) -> Result<(), BuildError> {
    fs::write(path, contents).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Handle on the arduino-cli executable
#[derive(Debug, Clone)]
pub struct ArduinoCli {
    program: PathBuf,
}

impl ArduinoCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments of a clean, verbose compile of `directory` for `board`
    pub fn compile_arguments(board: &str, directory: &Path, pass_through: &[String]) -> Vec<String> {
        let mut arguments = vec![
            "compile".to_string(),
            "-v".to_string(),
            "--clean".to_string(),
            "-b".to_string(),
            board.to_string(),
        ];
        arguments.extend(pass_through.iter().cloned());
        arguments.push(directory.display().to_string());
        arguments
    }

    /// Compiles the sketch and returns `(stdout, stderr)`.
    ///
    /// Blocks until arduino-cli exits; embedded builds have no useful upper
    /// bound so no timeout is applied.
    pub fn compile(
        &self,
        board: &str,
        directory: &Path,
        pass_through: &[String],
    ) -> Result<(String, String), BuildError> {
        let arguments = Self::compile_arguments(board, directory, pass_through);
        debug!("Invoking: {} {}", self.program.display(), arguments.join(" "));

        let output = Command::new(&self.program)
            .args(&arguments)
            .output()
            .map_err(|source| BuildError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(BuildError::ToolFailed {
                code: output.status.code(),
                stderr,
            });
        }
        Ok((stdout, stderr))
    }
}

/// Builds a throwaway probe sketch and captures arduino-cli's output.
///
/// The sketch lives in a temporary directory removed on return; the returned
/// [`SourceMap`] is only meaningful for its file names.
pub fn probe_build(
    cli: &ArduinoCli,
    board: &str,
    libraries: &[String],
    pass_through: &[String],
) -> Result<ProbeBuild, BuildError> {
    let scratch = tempfile::Builder::new()
        .prefix(PROBE_PREFIX)
        .tempdir()
        .map_err(|source| BuildError::Io {
            path: std::env::temp_dir(),
            source,
        })?;

    let sources = make_sketch(scratch.path(), libraries)?;
    let (stdout, stderr) = cli.compile(board, scratch.path(), pass_through)?;
    Ok(ProbeBuild {
        sources,
        stdout,
        stderr,
    })
}
