//! Test-execution tool port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::HealResult;

/// Outcome of one test-tool invocation.
///
/// No structured protocol is assumed: `output` is the combined stdout and
/// stderr free text, and pass/fail is driven by the exit code alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRunOutput {
    /// Whether the process exited with code 0.
    pub passed: bool,

    /// Combined stdout and stderr.
    pub output: String,

    /// Raw exit code when the process exited normally.
    pub exit_code: Option<i32>,

    /// Wall-clock duration of the run.
    pub duration_ms: u64,
}

/// Runs the external test suite, optionally scoped to a single target.
///
/// Implementations block until process exit and never interpret the output
/// themselves; parsing is the failure parser's job.
#[async_trait]
pub trait TestRunner: Send + Sync {
    /// Run the suite. `target` scopes the run to one test file or directory
    /// for targeted/batch mode.
    async fn run(&self, target: Option<&str>) -> HealResult<TestRunOutput>;
}
