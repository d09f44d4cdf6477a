use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Mines toolchain recipes from arduino-cli verbose build logs
#[derive(Parser, Debug)]
#[command(
    name = "recipe-miner",
    about = "Mines toolchain recipes from arduino-cli verbose build logs",
    version,
    author,
    long_about = "recipe-miner builds a throwaway probe sketch with arduino-cli in verbose mode \
                  and reverse-engineers the exact compiler, linker and archiver invocations \
                  arduino-cli used, so the same toolchain can drive an external build system."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Emit the CMake toolchain record for a board",
        long_about = "Runs a probe build for the board, copies the resulting core archive into \
                      the output directory and prints a ';'-terminated record of the archive \
                      path, the per-language compilers and flags, and the linker command.\n\n\
                      Examples:\n  \
                      recipe-miner cmake -b arduino:avr:uno -o build/arduino\n  \
                      recipe-miner cmake -b arduino:avr:uno -o build -l Servo -- --build-property build.extra_flags=-DX"
    )]
    Cmake(CmakeArgs),

    #[command(
        about = "Mine a full recipe report from a probe build or a captured log",
        long_about = "Segments arduino-cli verbose output into build stages and extracts the \
                      compile, archive, link and post-link recipes plus the sketch cache.\n\n\
                      Examples:\n  \
                      recipe-miner mine -b arduino:avr:uno\n  \
                      recipe-miner mine --log build.log --sketch-name sketch_probe1 --format json"
    )]
    Mine(MineArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct CmakeArgs {
    #[arg(short = 'b', long, value_name = "FQBN", help = "Fully qualified board name")]
    pub board: String,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Directory receiving the copied core archive"
    )]
    pub output: PathBuf,

    #[arg(
        short = 'l',
        long = "library",
        value_name = "LIB",
        help = "Library to include in the probe sketch (repeatable)"
    )]
    pub libraries: Vec<String>,

    #[arg(long, value_name = "PROGRAM", help = "arduino-cli executable to run")]
    pub arduino_cli: Option<PathBuf>,

    #[arg(
        last = true,
        value_name = "ARGS",
        help = "Extra arguments passed to 'arduino-cli compile'"
    )]
    pub pass_through: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct MineArgs {
    #[arg(
        short = 'b',
        long,
        value_name = "FQBN",
        required_unless_present = "log",
        conflicts_with = "log",
        help = "Fully qualified board name to probe"
    )]
    pub board: Option<String>,

    #[arg(
        long,
        value_name = "FILE",
        requires = "sketch_name",
        help = "Mine a previously captured arduino-cli verbose log instead of building"
    )]
    pub log: Option<PathBuf>,

    #[arg(
        long,
        value_name = "NAME",
        help = "Sketch directory name used when the log was captured"
    )]
    pub sketch_name: Option<String>,

    #[arg(
        short = 'l',
        long = "library",
        value_name = "LIB",
        help = "Library to include in the probe sketch (repeatable)"
    )]
    pub libraries: Vec<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        long,
        help = "Treat every line's first token as a tool instead of checking the filesystem"
    )]
    pub assume_tools: bool,

    #[arg(long, value_name = "PROGRAM", help = "arduino-cli executable to run")]
    pub arduino_cli: Option<PathBuf>,

    #[arg(
        last = true,
        value_name = "ARGS",
        help = "Extra arguments passed to 'arduino-cli compile'"
    )]
    pub pass_through: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
