//! Suture CLI entry point.

use clap::Parser;

use suture::cli::{Cli, Commands};
use suture::infrastructure::config::ConfigLoader;
use suture::infrastructure::logging::Logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging is wired from whatever config is loadable; a broken config
    // falls back to defaults here and surfaces properly when the command
    // itself loads it.
    let mut logging = ConfigLoader::load()
        .map(|config| config.logging)
        .unwrap_or_default();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    let logger = match Logger::init(&logging) {
        Ok(logger) => logger,
        Err(err) => suture::cli::handle_error(&err, cli.json),
    };

    let result = match cli.command {
        Commands::Heal(args) => suture::cli::commands::heal::execute(args, cli.json).await,
        Commands::Sessions(args) => suture::cli::commands::sessions::execute(args, cli.json).await,
        Commands::Backups(args) => suture::cli::commands::backups::execute(args, cli.json).await,
        Commands::Rollback(args) => suture::cli::commands::rollback::execute(args, cli.json).await,
        Commands::Learnings(args) => {
            suture::cli::commands::learnings::execute(args, cli.json).await
        }
        Commands::Init(args) => suture::cli::commands::init::execute(args, cli.json).await,
    };

    drop(logger);
    if let Err(err) = result {
        suture::cli::handle_error(&err, cli.json);
    }
}
