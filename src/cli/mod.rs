pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, CmakeArgs, Commands, MineArgs};
pub use output::{OutputFormat, OutputFormatter};
