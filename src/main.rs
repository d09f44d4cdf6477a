use recipe_miner::cli::commands::{CliArgs, Commands};
use recipe_miner::cli::handlers::{handle_cmake, handle_mine};
use recipe_miner::util::logging::{init_logging, resolve_level, LoggingConfig};
use recipe_miner::{MinerConfig, VERSION};

use clap::Parser;
use tracing::debug;

fn main() {
    let args = CliArgs::parse();
    let config = MinerConfig::default();

    init_logging(LoggingConfig {
        level: resolve_level(
            args.log_level.as_deref(),
            args.verbose,
            args.quiet,
            &config.log_level,
        ),
        use_json: config.log_json,
        ..Default::default()
    });

    debug!("recipe-miner v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Cmake(cmake_args) => handle_cmake(cmake_args, &config),
        Commands::Mine(mine_args) => handle_mine(mine_args, &config),
    };

    std::process::exit(exit_code);
}
