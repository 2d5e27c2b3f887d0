//! Implementation of the `suture init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::fs;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub initialized_path: PathBuf,
    pub directories_created: Vec<String>,
    pub config_written: bool,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if !self.directories_created.is_empty() {
            lines.push("\nCreated directories:".to_string());
            for dir in &self.directories_created {
                lines.push(format!("  - {dir}"));
            }
        }
        if self.config_written {
            lines.push("\nDefault config written to .suture/config.yaml".to_string());
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let suture_dir = target_path.join(".suture");
    let config_path = suture_dir.join("config.yaml");

    // Session and learning records are never removed, even with --force;
    // reinitializing only refreshes the config file.
    if config_path.exists() && !args.force {
        let output_data = InitOutput {
            success: false,
            message: "Already initialized. Use --force to rewrite the config.".to_string(),
            initialized_path: target_path,
            directories_created: vec![],
            config_written: false,
        };
        output(&output_data, json_mode);
        return Ok(());
    }

    let mut directories_created = vec![];
    let dirs = [
        suture_dir.clone(),
        suture_dir.join("sessions"),
        suture_dir.join("learnings"),
        suture_dir.join("logs"),
    ];
    for dir in &dirs {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let relative = dir
                .strip_prefix(&target_path)
                .unwrap_or(dir)
                .to_string_lossy()
                .to_string();
            directories_created.push(relative);
        }
    }

    let yaml =
        serde_yaml::to_string(&Config::default()).context("Failed to serialize default config")?;
    let header = "# Suture configuration. Overridden by .suture/local.yaml, then SUTURE_* env vars.\n";
    fs::write(&config_path, format!("{header}{yaml}"))
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    // local.yaml and logs are per-checkout state.
    let gitignore_path = suture_dir.join(".gitignore");
    if !gitignore_path.exists() {
        fs::write(&gitignore_path, "local.yaml\nlogs/\n")
            .await
            .context("Failed to write .suture/.gitignore")?;
    }

    let output_data = InitOutput {
        success: true,
        message: if args.force {
            "Reinitialized; config rewritten with defaults.".to_string()
        } else {
            "Initialized successfully.".to_string()
        },
        initialized_path: target_path,
        directories_created,
        config_written: true,
    };
    output(&output_data, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_scaffolds_directories_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            force: false,
            path: dir.path().to_path_buf(),
        };

        execute(args, true).await.unwrap();

        let suture = dir.path().join(".suture");
        assert!(suture.join("sessions").is_dir());
        assert!(suture.join("learnings").is_dir());
        assert!(suture.join("logs").is_dir());

        let config = std::fs::read_to_string(suture.join("config.yaml")).unwrap();
        assert!(config.contains("runner:"));
        assert!(config.contains("healing:"));
    }

    #[tokio::test]
    async fn test_init_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let suture = dir.path().join(".suture");
        std::fs::create_dir_all(&suture).unwrap();
        std::fs::write(suture.join("config.yaml"), "runner:\n  command: mine\n").unwrap();

        let args = InitArgs {
            force: false,
            path: dir.path().to_path_buf(),
        };
        execute(args, true).await.unwrap();

        let config = std::fs::read_to_string(suture.join("config.yaml")).unwrap();
        assert!(config.contains("command: mine"));
    }

    #[tokio::test]
    async fn test_init_force_rewrites_config() {
        let dir = tempfile::tempdir().unwrap();
        let suture = dir.path().join(".suture");
        std::fs::create_dir_all(&suture).unwrap();
        std::fs::write(suture.join("config.yaml"), "stale").unwrap();

        let args = InitArgs {
            force: true,
            path: dir.path().to_path_buf(),
        };
        execute(args, true).await.unwrap();

        let config = std::fs::read_to_string(suture.join("config.yaml")).unwrap();
        assert!(config.contains("runner:"));
    }
}
