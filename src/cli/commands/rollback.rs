//! Backup restoration command.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ConfigLoader;
use crate::services::ChangeApplier;

#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// File to restore from its backup
    pub file: Option<PathBuf>,

    /// Restore every pending backup found under --root
    #[arg(long, conflicts_with = "file")]
    pub all: bool,

    /// Directory searched in --all mode (defaults to current directory)
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct RollbackOutput {
    pub restored: Vec<PathBuf>,
    pub failed: Vec<RollbackFailure>,
}

#[derive(Debug, serde::Serialize)]
pub struct RollbackFailure {
    pub file: PathBuf,
    pub error: String,
}

impl CommandOutput for RollbackOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![];
        for file in &self.restored {
            lines.push(format!("✓ restored {}", file.display()));
        }
        for failure in &self.failed {
            lines.push(format!("✗ {}: {}", failure.file.display(), failure.error));
        }
        if lines.is_empty() {
            lines.push("Nothing to restore.".to_string());
        } else {
            lines.push(format!(
                "\n{} restored, {} failed",
                self.restored.len(),
                self.failed.len()
            ));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: RollbackArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;
    let applier = ChangeApplier::new(&config.storage.backup_suffix);

    let targets: Vec<PathBuf> = if args.all {
        applier
            .find_backups(&args.root)
            .await?
            .into_iter()
            .filter_map(|backup| applier.original_path(&backup))
            .collect()
    } else if let Some(file) = args.file {
        vec![file]
    } else {
        bail!("Pass a file to restore, or --all to restore every pending backup");
    };

    let mut restored = Vec::new();
    let mut failed = Vec::new();
    for file in targets {
        match applier.rollback(&file).await {
            Ok(()) => restored.push(file),
            Err(err) => failed.push(RollbackFailure {
                file,
                error: err.to_string(),
            }),
        }
    }

    let had_failures = !failed.is_empty();
    let out = RollbackOutput { restored, failed };
    output(&out, json_mode);

    if had_failures {
        bail!("Some rollbacks failed");
    }
    Ok(())
}
