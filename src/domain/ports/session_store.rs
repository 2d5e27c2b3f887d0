//! Durable storage port for sessions, learnings, and the task log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::HealResult;
use crate::domain::models::{HealingSession, SessionLearning};

/// Cross-reference record for an externally created tracker issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TaskRecord {
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub issue_id: String,
    pub url: String,
}

/// Persists healing sessions and their derived learnings.
///
/// Sessions and learnings are each stored one-record-per-`session_id`;
/// the task log is an append-only flat list of tracker cross-references.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a session, replacing any previous record for its id.
    async fn save_session(&self, session: &HealingSession) -> HealResult<()>;

    /// Load one session by id.
    async fn load_session(&self, session_id: Uuid) -> HealResult<HealingSession>;

    /// Load every persisted session, newest first.
    async fn list_sessions(&self) -> HealResult<Vec<HealingSession>>;

    /// Persist a learning, replacing any previous record for its session id.
    async fn save_learning(&self, learning: &SessionLearning) -> HealResult<()>;

    /// Load every persisted learning.
    async fn list_learnings(&self) -> HealResult<Vec<SessionLearning>>;

    /// Append one tracker cross-reference to the task log.
    async fn append_task_record(&self, record: &TaskRecord) -> HealResult<()>;
}
