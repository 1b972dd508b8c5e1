//! segreplay CLI entry point

mod commands;

use anyhow::Result;
use clap::{CommandFactory, FromArgMatches};

use segreplay::cli::{long_version, Cli, Commands, ConfigCommands};
use segreplay::logging::init_logging;
use segreplay::Config;

fn main() -> Result<()> {
    // clap wants a 'static long version; it lives for the whole process anyway
    let version: &'static str = Box::leak(long_version().into_boxed_str());
    let matches = Cli::command().long_version(version).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    init_logging(cli.verbose);

    match cli.command {
        Commands::Inspect(args) => commands::inspect::handle(&args),
        Commands::Play(args) => {
            let config = Config::load()?;
            commands::play::handle(&args, &config)
        }
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::handle_show(),
            ConfigCommands::Path => commands::config::handle_path(),
        },
        Commands::Completions { shell } => {
            commands::completions::handle(shell);
            Ok(())
        }
    }
}
