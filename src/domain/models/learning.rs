//! Learnings derived from persisted sessions, and the task suggestions they
//! produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse error buckets used when looking for recurring failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Selector,
    Timeout,
    Network,
    Auth,
    Permission,
    Other,
}

impl ErrorCategory {
    /// Bucket an error message by simple keyword presence.
    pub fn categorize(message: &str) -> Self {
        let m = message.to_lowercase();
        if m.contains("selector") || m.contains("testid") || m.contains("not found in the dom") {
            Self::Selector
        } else if m.contains("timeout") || m.contains("timed out") {
            Self::Timeout
        } else if m.contains("network") || m.contains("econnrefused") || m.contains("fetch") {
            Self::Network
        } else if m.contains("auth") || m.contains("unauthorized") || m.contains("401") {
            Self::Auth
        } else if m.contains("permission") || m.contains("forbidden") || m.contains("403") {
            Self::Permission
        } else {
            Self::Other
        }
    }

    /// Suggestion priority for this category, on the tracker's 1 (urgent) to
    /// 4 (low) scale. Auth and permission failures rank above cosmetic ones.
    pub const fn default_priority(self) -> u8 {
        match self {
            Self::Auth | Self::Permission => 2,
            Self::Timeout | Self::Network => 3,
            Self::Selector | Self::Other => 4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Selector => "selector",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file touched more than once within a single session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RefactorCandidate {
    pub file: String,
    pub touch_count: usize,
}

/// An error category that recurred within a single session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecurringError {
    pub category: ErrorCategory,
    pub count: usize,
    /// One representative message from the bucket.
    pub sample: String,
}

/// An external-interface artifact handed to the issue tracker; the engine
/// produces but never owns these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TaskSuggestion {
    pub title: String,
    pub description: String,
    /// Tracker priority, 1 (urgent) through 4 (low).
    pub priority: u8,
    pub labels: Vec<String>,
    pub reasoning: String,
    pub estimated_effort: String,
}

/// Read-only aggregate derived from one persisted session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionLearning {
    /// Session this learning was derived from; also the persistence key.
    pub session_id: Uuid,

    pub analyzed_at: DateTime<Utc>,

    /// Files modified more than once within the session.
    pub refactor_candidates: Vec<RefactorCandidate>,

    /// Error categories that recurred within the session.
    pub recurring_errors: Vec<RecurringError>,

    /// Tests whose failures could not be traced to a source file.
    pub coverage_gaps: Vec<String>,

    /// Free-text tech-debt observations.
    pub tech_debt: Vec<String>,

    /// Suggestions derived from the signals above.
    pub suggestions: Vec<TaskSuggestion>,
}

/// A suggestion ranked across many sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RankedSuggestion {
    pub suggestion: TaskSuggestion,
    /// How many times this suggestion appeared across all learnings.
    pub occurrences: usize,
    /// Number of distinct sessions that produced it.
    pub sessions_affected: usize,
}

/// The cross-session aggregation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AggregateReport {
    pub generated_at: DateTime<Utc>,
    pub sessions_analyzed: usize,
    /// Suggestions ordered by sessions affected, then occurrences, then
    /// priority.
    pub ranked: Vec<RankedSuggestion>,
}
