//! Subcommand handlers
//!
//! Each handler returns the process exit code. Failures are reported on
//! standard error with a single `[ERROR]` line carrying the whole error chain.

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::commands::{CmakeArgs, MineArgs};
use super::output::{cmake_record, OutputFormatter};
use crate::config::MinerConfig;
use crate::mining::harvest::{compilation_commands, linker_command};
use crate::mining::stages::log_lines;
use crate::mining::{mine, parse_stages, AnyTool, MiningReport, SearchPath, SourceMap, ToolLocator};
use crate::sketch::{probe_build, ArduinoCli};

fn report_failure(err: &anyhow::Error) -> i32 {
    eprintln!("[ERROR] Problem occurred while mining Arduino. {:#}", err);
    1
}

fn prepare_config(config: &MinerConfig, arduino_cli: Option<PathBuf>) -> Result<MinerConfig> {
    let config = config.clone().with_arduino_cli(arduino_cli);
    config.validate()?;
    debug!("Configuration: {:?}", config.to_display_map());
    Ok(config)
}

pub fn handle_cmake(args: &CmakeArgs, config: &MinerConfig) -> i32 {
    match run_cmake(args, config) {
        Ok(record) => {
            let mut stdout = io::stdout().lock();
            match write!(stdout, "{}", record).and_then(|_| stdout.flush()) {
                Ok(()) => 0,
                Err(e) => report_failure(&anyhow::Error::new(e).context("Failed to write record")),
            }
        }
        Err(e) => report_failure(&e),
    }
}

fn run_cmake(args: &CmakeArgs, config: &MinerConfig) -> Result<String> {
    let config = prepare_config(config, args.arduino_cli.clone())?;
    let cli = ArduinoCli::new(&config.arduino_cli);

    info!("Probing toolchain for {}", args.board);
    let build = probe_build(&cli, &args.board, &args.libraries, &args.pass_through)?;
    let lines = log_lines(&build.stdout);

    let commands = compilation_commands(&lines, &build.sources)?;
    let linker = linker_command(&lines)?;
    debug!("Core archive: {}", linker.core_archive.display());

    let destination = copy_core_archive(&linker.core_archive, &args.output)?;
    cmake_record(&destination, &commands, &linker)
}

fn copy_core_archive(core_archive: &Path, output: &Path) -> Result<PathBuf> {
    let file_name = core_archive
        .file_name()
        .with_context(|| format!("Core archive has no file name: {}", core_archive.display()))?;
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let destination = output.join(file_name);
    fs::copy(core_archive, &destination).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            core_archive.display(),
            destination.display()
        )
    })?;
    Ok(destination)
}

pub fn handle_mine(args: &MineArgs, config: &MinerConfig) -> i32 {
    let rendered = run_mine(args, config).and_then(|report| {
        OutputFormatter::new(args.format.into()).format(&report)
    });

    match rendered {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => report_failure(&e),
    }
}

fn run_mine(args: &MineArgs, config: &MinerConfig) -> Result<MiningReport> {
    let (stdout, sources) = match (&args.log, &args.sketch_name, &args.board) {
        (Some(log), Some(sketch_name), _) => {
            info!("Mining captured log {}", log.display());
            let stdout = fs::read_to_string(log)
                .with_context(|| format!("Failed to read log {}", log.display()))?;
            (stdout, SourceMap::new(Path::new(sketch_name), sketch_name))
        }
        (_, _, Some(board)) => {
            let config = prepare_config(config, args.arduino_cli.clone())?;
            info!("Probing toolchain for {}", board);
            let build = probe_build(
                &ArduinoCli::new(&config.arduino_cli),
                board,
                &args.libraries,
                &args.pass_through,
            )?;
            (build.stdout, build.sources)
        }
        _ => anyhow::bail!("Either --board or --log with --sketch-name is required"),
    };

    let search_path = SearchPath::default();
    let locator: &dyn ToolLocator = if args.assume_tools {
        &AnyTool
    } else {
        &search_path
    };

    let stages = parse_stages(&stdout, locator);
    Ok(mine(&stages, &sources)?)
}
