//! Subprocess-backed test runner.
//!
//! Runs the configured test command (e.g. `npm test`, `pnpm vitest run`)
//! and captures its combined output for the failure parser. Pass/fail is
//! decided by the exit code alone.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::info;

use crate::domain::errors::{HealError, HealResult};
use crate::domain::models::config::RunnerConfig;
use crate::domain::ports::{TestRunOutput, TestRunner};

/// Test runner that shells out to the project's test command.
///
/// A scoped target (file or directory) is appended as a final argument,
/// which is the convention jest, vitest and pytest all follow.
pub struct SubprocessRunner {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl SubprocessRunner {
    /// Create a runner for the given command line.
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }

    /// Create a runner from the loaded configuration.
    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(
            config.command.clone(),
            config.args.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl TestRunner for SubprocessRunner {
    async fn run(&self, target: Option<&str>) -> HealResult<TestRunOutput> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        if let Some(target) = target {
            cmd.arg(target);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(command = %self.command, ?target, "running test suite");
        let started = Instant::now();

        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| HealError::RunnerTimeout(self.timeout.as_secs()))?
            .map_err(|e| HealError::RunnerSpawn {
                command: self.command.clone(),
                reason: e.to_string(),
            })?;

        let duration_ms = started.elapsed().as_millis().try_into().unwrap_or(u64::MAX);

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&stderr);
        }

        let passed = output.status.success();
        info!(
            passed,
            exit_code = ?output.status.code(),
            duration_ms,
            "test run complete"
        );

        Ok(TestRunOutput {
            passed,
            output: combined,
            exit_code: output.status.code(),
            duration_ms,
        })
    }
}
