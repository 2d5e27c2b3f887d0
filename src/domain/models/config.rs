use serde::{Deserialize, Serialize};

/// Main configuration structure for Suture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Healing loop configuration
    #[serde(default)]
    pub healing: HealingConfig,

    /// Test runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Completion service configuration
    #[serde(default)]
    pub completion: CompletionConfig,

    /// On-disk storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Retry policy for completion requests
    #[serde(default)]
    pub retry: RetryConfig,

    /// Issue tracker configuration
    #[serde(default)]
    pub tracker: TrackerConfig,
}

/// Healing loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HealingConfig {
    /// Maximum re-run cycles per session (1-20)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Targets healed concurrently per batch in batch mode (1-20)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

const fn default_max_iterations() -> u32 {
    3
}

const fn default_batch_size() -> usize {
    5
}

impl Default for HealingConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            batch_size: default_batch_size(),
        }
    }
}

/// Test runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunnerConfig {
    /// Test command to execute
    #[serde(default = "default_runner_command")]
    pub command: String,

    /// Arguments passed before the optional target
    #[serde(default)]
    pub args: Vec<String>,

    /// Timeout per test run in seconds
    #[serde(default = "default_runner_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_runner_command() -> String {
    "npm".to_string()
}

const fn default_runner_timeout_secs() -> u64 {
    600
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            command: default_runner_command(),
            args: vec!["test".to_string()],
            timeout_secs: default_runner_timeout_secs(),
        }
    }
}

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompletionConfig {
    /// API key (can also be set via ANTHROPIC_API_KEY env var).
    /// When absent the engine runs heuristic-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model to use
    #[serde(default = "default_completion_model")]
    pub model: String,

    /// Base URL for the API (for testing/proxies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Maximum output tokens per completion request
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: usize,
}

fn default_completion_model() -> String {
    "claude-sonnet-4-5-20250929".to_string()
}

const fn default_max_output_tokens() -> usize {
    4096
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_completion_model(),
            base_url: None,
            max_output_tokens: default_max_output_tokens(),
        }
    }
}

/// On-disk storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageConfig {
    /// Root directory for sessions, learnings, and the task log
    #[serde(default = "default_storage_root")]
    pub root: String,

    /// Suffix appended to a file path to form its backup path
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,
}

fn default_storage_root() -> String {
    ".suture".to_string()
}

fn default_backup_suffix() -> String {
    ".backup".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            backup_suffix: default_backup_suffix(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling JSON log files; console-only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,

    /// Number of days to retain logs
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

const fn default_retention_days() -> u32 {
    30
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            retention_days: default_retention_days(),
        }
    }
}

/// Retry policy configuration for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Issue tracker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TrackerConfig {
    /// Enable publishing task suggestions to the tracker
    #[serde(default)]
    pub enabled: bool,

    /// Team key suggestions are filed under
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,

    /// API key (can also be set via LINEAR_API_KEY env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override (for testing/proxies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}
