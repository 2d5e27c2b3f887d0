//! Structured test failure records.

use serde::{Deserialize, Serialize};

/// A single failing test extracted from one raw test-tool invocation.
///
/// Produced by the failure parser; immutable once created and scoped to the
/// session that observed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TestFailure {
    /// Test name as reported by the runner, or a synthesized placeholder.
    pub test_name: String,

    /// First line of the error block.
    pub error_message: String,

    /// The stack frames that followed the error message, newline-joined.
    pub stack_excerpt: String,

    /// Source file the first stack frame points at, when one was parseable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,

    /// Line number within `source_file`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl TestFailure {
    /// Create a failure with no source location.
    pub fn new(
        test_name: impl Into<String>,
        error_message: impl Into<String>,
        stack_excerpt: impl Into<String>,
    ) -> Self {
        Self {
            test_name: test_name.into(),
            error_message: error_message.into(),
            stack_excerpt: stack_excerpt.into(),
            source_file: None,
            line: None,
        }
    }

    /// Fallback record covering an entire unrecognized failure output.
    ///
    /// Used when the runner reported failure but no structured error block
    /// could be extracted, so downstream stages always have at least one
    /// record to reason about.
    pub fn generic(raw_output: &str) -> Self {
        let message = raw_output
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("test run failed with no output")
            .to_string();

        Self {
            test_name: "test-suite".to_string(),
            error_message: message,
            stack_excerpt: raw_output.chars().take(500).collect(),
            source_file: None,
            line: None,
        }
    }
}
