//! Top-level CLI argument types.

use clap::{Parser, Subcommand};

use crate::cli::commands::{
    backups::BackupsArgs, heal::HealArgs, init::InitArgs, learnings::LearningsArgs,
    rollback::RollbackArgs, sessions::SessionsArgs,
};

/// Test-healing orchestrator.
#[derive(Parser, Debug)]
#[command(name = "suture")]
#[command(about = "Heal failing test suites: classify, gate, patch, verify", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a healing session against the configured test suite
    Heal(HealArgs),
    /// Inspect persisted healing sessions
    Sessions(SessionsArgs),
    /// List pending backup files
    Backups(BackupsArgs),
    /// Restore files from their backups
    Rollback(RollbackArgs),
    /// Analyze sessions into learnings and suggested follow-up tasks
    Learnings(LearningsArgs),
    /// Scaffold the .suture directory and a default config
    Init(InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }
}
