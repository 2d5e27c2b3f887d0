//! External issue tracker port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::HealResult;

/// Issue creation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    /// Team key the issue is filed under.
    pub team: String,
    /// Tracker priority, 1 (urgent) through 4 (low).
    pub priority: u8,
    /// Label identifiers resolved via [`IssueTracker::ensure_labels`].
    pub label_ids: Vec<String>,
}

/// The identifier and URL of a created issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreatedIssue {
    pub id: String,
    pub url: String,
}

/// Create-only issue tracker interface.
///
/// This interface is consumed, never implemented, by the core engine; it
/// exists so the learnings aggregator can optionally publish suggestions.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Resolve label names to identifiers, creating any that are missing.
    async fn ensure_labels(&self, team: &str, names: &[String]) -> HealResult<Vec<String>>;

    /// Create one issue and return its identifier and URL.
    async fn create_issue(&self, issue: &NewIssue) -> HealResult<CreatedIssue>;
}
