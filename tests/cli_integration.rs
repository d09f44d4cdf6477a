//! CLI integration tests
//!
//! These tests run the built binary and verify:
//! - Command parsing and help output
//! - Mining a captured log in every output format
//! - The CMake record produced from a (fake) arduino-cli probe build
//! - Error reporting and exit codes

mod support;

use recipe_miner::mining::tokenize::split_line_lenient;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use support::{uno_log, AVR_BIN, BUILD_DIR, TOOL_PREFIX};
use tempfile::TempDir;

const ERROR_PREFIX: &str = "[ERROR] Problem occurred while mining Arduino.";

/// Helper to get the path to the recipe-miner binary
fn miner_bin() -> PathBuf {
    let mut path = env::current_exe()
        .expect("Failed to get current executable path")
        .parent()
        .expect("No parent")
        .to_path_buf();

    // If we're in deps/, go up one more level
    if path.ends_with("deps") {
        path = path.parent().expect("No parent").to_path_buf();
    }

    path.join("recipe-miner")
}

fn run(args: &[&str]) -> Output {
    Command::new(miner_bin())
        .args(args)
        .env_remove("RECIPE_MINER_ARDUINO_CLI")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute recipe-miner")
}

/// Copies the fixture log into `dir` with the toolchain installed under
/// `dir/arduino15`, creating a placeholder file for every tool it invokes
fn relocated_log(dir: &Path) -> PathBuf {
    let install = dir.join("arduino15");
    let log = uno_log().replace(
        TOOL_PREFIX.trim_end_matches('/'),
        &install.display().to_string(),
    );

    for line in log.lines() {
        if let Some(program) = split_line_lenient(line).first() {
            if program.starts_with(&install.display().to_string()) {
                let program = Path::new(program);
                fs::create_dir_all(program.parent().unwrap()).unwrap();
                fs::write(program, "").unwrap();
                mark_executable(program);
            }
        }
    }

    let path = dir.join("build.log");
    fs::write(&path, log).unwrap();
    path
}

#[cfg(unix)]
fn mark_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) {}

#[cfg(unix)]
fn write_script(path: &Path, body: &str) {
    fs::write(path, format!("#!/bin/sh\n{}", body)).unwrap();
    mark_executable(path);
}

#[test]
#[serial]
fn test_cli_help() {
    let output = run(&["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("recipe-miner"));
    assert!(stdout.contains("cmake"));
    assert!(stdout.contains("mine"));
}

#[test]
#[serial]
fn test_cli_version() {
    let output = run(&["--version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
#[serial]
fn test_mine_log_json() {
    let dir = TempDir::new().unwrap();
    let log = relocated_log(dir.path());
    let install = dir.path().join("arduino15");

    let output = run(&[
        "mine",
        "--log",
        log.to_str().unwrap(),
        "--sketch-name",
        "sketch_probe1",
        "--format",
        "json",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["sketch_cache"], BUILD_DIR);
    assert_eq!(
        report["archive"]["archiver"],
        format!(
            "{}/packages/arduino/tools/avr-gcc/7.3.0-atmel3.6.1-arduino7/bin/avr-gcc-ar",
            install.display()
        )
    );
    assert_eq!(report["archive"]["flags"][0], "rcs");
    for source in ["S", "c", "cpp", "ino"] {
        assert!(report["compile"][source]["tool"].is_string(), "missing {}", source);
    }
    assert_eq!(report["link"]["libraries"][1], "-lm");
    assert_eq!(report["post_link"].as_array().unwrap().len(), 3);
}

#[test]
#[serial]
fn test_mine_log_yaml() {
    let dir = TempDir::new().unwrap();
    let log = relocated_log(dir.path());

    let output = run(&[
        "mine",
        "--log",
        log.to_str().unwrap(),
        "--sketch-name",
        "sketch_probe1",
        "-f",
        "yaml",
    ]);
    assert!(output.status.success());

    let report: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    assert_eq!(report["sketch_cache"].as_str(), Some(BUILD_DIR));
    assert_eq!(report["compile"]["c"]["flags"][3].as_str(), Some("-std=gnu11"));
}

#[test]
#[serial]
fn test_mine_log_human_with_assumed_tools() {
    let output = run(&[
        "mine",
        "--log",
        support::fixture_path("arduino_avr_uno.log").to_str().unwrap(),
        "--sketch-name",
        "sketch_probe1",
        "--assume-tools",
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Arduino Toolchain Recipes"));
    assert!(stdout.contains("Compile *.ino:"));
    assert!(stdout.contains(&format!("Linker:    {}/avr-gcc", AVR_BIN)));
    assert!(stdout.contains("Post-link Steps:"));
}

#[test]
#[serial]
fn test_mine_missing_log_fails() {
    let output = run(&[
        "mine",
        "--log",
        "/nonexistent/build.log",
        "--sketch-name",
        "sketch_probe1",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(ERROR_PREFIX));
    assert!(stderr.contains("Failed to read log /nonexistent/build.log"));
    assert!(output.stdout.is_empty());
}

#[test]
#[serial]
fn test_mine_log_without_link_stage_fails() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("build.log");
    fs::write(
        &log,
        uno_log().replace("Linking everything together...\n", ""),
    )
    .unwrap();

    let output = run(&[
        "mine",
        "--log",
        log.to_str().unwrap(),
        "--sketch-name",
        "sketch_probe1",
        "--assume-tools",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(&format!(
        "{} Failed to find any output for build stage: link",
        ERROR_PREFIX
    )));
}

#[test]
#[serial]
fn test_mine_requires_a_source() {
    let output = run(&["mine", "--format", "json"]);
    assert!(!output.status.success());
}

#[cfg(unix)]
#[test]
#[serial]
fn test_cmake_record() {
    let dir = TempDir::new().unwrap();
    let build = dir.path().join("build");
    fs::create_dir_all(build.join("core")).unwrap();
    fs::write(build.join("core").join("core.a"), b"!<arch>\n").unwrap();

    let log = dir.path().join("build.log");
    fs::write(&log, uno_log().replace(BUILD_DIR, &build.display().to_string())).unwrap();

    // Replays the log for whatever sketch directory it is asked to compile
    let fake_cli = dir.path().join("arduino-cli");
    write_script(
        &fake_cli,
        &format!(
            "for last; do :; done\nsed \"s/sketch_probe1/$(basename \"$last\")/g\" \"{}\"\n",
            log.display()
        ),
    );

    let out = dir.path().join("out");
    let output = run(&[
        "cmake",
        "-b",
        "arduino:avr:uno",
        "-o",
        out.to_str().unwrap(),
        "--arduino-cli",
        fake_cli.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let record = String::from_utf8(output.stdout).unwrap();
    assert!(record.starts_with(&format!(
        "{}/core.a;{}/avr-gcc;-g|-x|assembler-with-cpp|-flto|",
        out.display(),
        AVR_BIN
    )));
    assert!(record.ends_with(&format!(
        ";{}/avr-gcc;-w|-Os|-g|-flto|-fuse-linker-plugin|-Wl,--gc-sections|-mmcu=atmega328p|-lm;",
        AVR_BIN
    )));
    assert_eq!(record.matches(';').count(), 9);
    assert_eq!(fs::read(out.join("core.a")).unwrap(), b"!<arch>\n");
}

#[cfg(unix)]
#[test]
#[serial]
fn test_cmake_reports_tool_failure() {
    let dir = TempDir::new().unwrap();
    let fake_cli = dir.path().join("arduino-cli");
    write_script(
        &fake_cli,
        "echo 'Error during build: Platform not installed' >&2\nexit 2\n",
    );

    let output = run(&[
        "cmake",
        "-b",
        "vendor:arch:board",
        "-o",
        dir.path().join("out").to_str().unwrap(),
        "--arduino-cli",
        fake_cli.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(&format!(
        "{} arduino-cli failed with return code: 2",
        ERROR_PREFIX
    )));
    assert!(stderr.contains("\tError during build: Platform not installed"));
    assert!(output.stdout.is_empty());
}

#[test]
#[serial]
fn test_cmake_missing_arduino_cli() {
    let dir = TempDir::new().unwrap();
    let output = run(&[
        "cmake",
        "-b",
        "arduino:avr:uno",
        "-o",
        dir.path().to_str().unwrap(),
        "--arduino-cli",
        "/nonexistent/arduino-cli",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to run /nonexistent/arduino-cli"));
}
