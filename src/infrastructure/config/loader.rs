use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_iterations: {0}. Must be between 1 and 20")]
    InvalidMaxIterations(u32),

    #[error("Invalid batch_size: {0}. Must be between 1 and 20")]
    InvalidBatchSize(usize),

    #[error("Runner command cannot be empty")]
    EmptyRunnerCommand,

    #[error("Invalid runner timeout: {0}s. Must be at least 1")]
    InvalidRunnerTimeout(u64),

    #[error("Invalid max_output_tokens: {0}. Must be at least 1")]
    InvalidMaxOutputTokens(usize),

    #[error("Storage root cannot be empty")]
    EmptyStorageRoot,

    #[error("Invalid backup suffix: '{0}'. Must start with '.' and name at least one character")]
    InvalidBackupSuffix(String),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Tracker is enabled but no team key is configured")]
    MissingTrackerTeam,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .suture/config.yaml (project config, created by init)
    /// 3. .suture/local.yaml (project local overrides, optional)
    /// 4. Environment variables (SUTURE_* prefix, highest priority)
    ///
    /// Configuration is always project-local (pwd/.suture/) so one machine
    /// can heal several projects with different settings.
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".suture/config.yaml"))
            .merge(Yaml::file(".suture/local.yaml"))
            .merge(Env::prefixed("SUTURE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.healing.max_iterations == 0 || config.healing.max_iterations > 20 {
            return Err(ConfigError::InvalidMaxIterations(
                config.healing.max_iterations,
            ));
        }

        if config.healing.batch_size == 0 || config.healing.batch_size > 20 {
            return Err(ConfigError::InvalidBatchSize(config.healing.batch_size));
        }

        if config.runner.command.is_empty() {
            return Err(ConfigError::EmptyRunnerCommand);
        }

        if config.runner.timeout_secs == 0 {
            return Err(ConfigError::InvalidRunnerTimeout(config.runner.timeout_secs));
        }

        if config.completion.max_output_tokens == 0 {
            return Err(ConfigError::InvalidMaxOutputTokens(
                config.completion.max_output_tokens,
            ));
        }

        if config.storage.root.is_empty() {
            return Err(ConfigError::EmptyStorageRoot);
        }

        if !config.storage.backup_suffix.starts_with('.') || config.storage.backup_suffix.len() < 2
        {
            return Err(ConfigError::InvalidBackupSuffix(
                config.storage.backup_suffix.clone(),
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.retry.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(config.retry.max_retries));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        if config.tracker.enabled && config.tracker.team.is_none() {
            return Err(ConfigError::MissingTrackerTeam);
        }

        Ok(())
    }
}
