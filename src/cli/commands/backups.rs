//! Backup listing command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ConfigLoader;
use crate::services::ChangeApplier;

#[derive(Args, Debug)]
pub struct BackupsArgs {
    #[command(subcommand)]
    pub command: BackupsCommands,
}

#[derive(Subcommand, Debug)]
pub enum BackupsCommands {
    /// List pending backups under a directory tree
    List {
        /// Directory to search (defaults to current directory)
        #[arg(default_value = ".")]
        root: PathBuf,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct BackupListOutput {
    pub root: PathBuf,
    /// Original file paired with its backup.
    pub backups: Vec<(PathBuf, PathBuf)>,
}

impl CommandOutput for BackupListOutput {
    fn to_human(&self) -> String {
        if self.backups.is_empty() {
            return format!("No pending backups under {}.", self.root.display());
        }
        let table = TableFormatter::new().format_backups(&self.backups);
        format!(
            "{table}\n{} pending backup(s). Restore with 'suture rollback'.",
            self.backups.len()
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: BackupsArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;
    let applier = ChangeApplier::new(&config.storage.backup_suffix);

    match args.command {
        BackupsCommands::List { root } => {
            let found = applier.find_backups(&root).await?;
            let backups = found
                .into_iter()
                .filter_map(|backup| {
                    applier
                        .original_path(&backup)
                        .map(|original| (original, backup))
                })
                .collect();
            let out = BackupListOutput { root, backups };
            output(&out, json_mode);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_listing_names_the_root() {
        let out = BackupListOutput {
            root: PathBuf::from("src"),
            backups: vec![],
        };
        assert!(out.to_human().contains("No pending backups under src"));
    }

    #[test]
    fn test_listing_counts_backups() {
        let out = BackupListOutput {
            root: PathBuf::from("."),
            backups: vec![(
                PathBuf::from("a.ts"),
                PathBuf::from("a.ts.heal-backup"),
            )],
        };
        assert!(out.to_human().contains("1 pending backup(s)"));
    }
}
