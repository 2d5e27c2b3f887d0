//! JSON-file session store rooted at the project's storage directory.
//!
//! Layout under the root (default `.suture/`):
//! - `sessions/<session_id>.json` - one file per healing session
//! - `learnings/<session_id>.json` - one file per derived learning
//! - `tasks.jsonl` - append-only log of created tracker issues

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::errors::{HealError, HealResult};
use crate::domain::models::{HealingSession, SessionLearning};
use crate::domain::ports::{SessionStore, TaskRecord};

/// File-backed [`SessionStore`] implementation.
pub struct FsSessionStore {
    root: PathBuf,
}

impl FsSessionStore {
    /// Create a store rooted at the given directory. Directories are
    /// created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    fn learnings_dir(&self) -> PathBuf {
        self.root.join("learnings")
    }

    fn session_path(&self, session_id: Uuid) -> PathBuf {
        self.sessions_dir().join(format!("{session_id}.json"))
    }

    fn learning_path(&self, session_id: Uuid) -> PathBuf {
        self.learnings_dir().join(format!("{session_id}.json"))
    }

    fn tasks_path(&self) -> PathBuf {
        self.root.join("tasks.jsonl")
    }

    async fn write_json<T: Serialize>(path: &Path, value: &T) -> HealResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json).await?;
        Ok(())
    }

    /// Read every `.json` record in a directory. Unreadable records are
    /// skipped with a warning so one corrupt file cannot hide the rest.
    async fn read_dir_json<T: DeserializeOwned>(dir: &Path) -> HealResult<Vec<T>> {
        let mut records = Vec::new();

        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(records),
            Err(err) => return Err(err.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let raw = fs::read_to_string(&path).await?;
            match serde_json::from_str(&raw) {
                Ok(value) => records.push(value),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unreadable record");
                }
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl SessionStore for FsSessionStore {
    async fn save_session(&self, session: &HealingSession) -> HealResult<()> {
        let path = self.session_path(session.session_id);
        Self::write_json(&path, session).await?;
        debug!(session_id = %session.session_id, path = %path.display(), "session persisted");
        Ok(())
    }

    async fn load_session(&self, session_id: Uuid) -> HealResult<HealingSession> {
        let path = self.session_path(session_id);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(HealError::SessionNotFound(session_id));
            }
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    async fn list_sessions(&self) -> HealResult<Vec<HealingSession>> {
        let mut sessions: Vec<HealingSession> = Self::read_dir_json(&self.sessions_dir()).await?;
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }

    async fn save_learning(&self, learning: &SessionLearning) -> HealResult<()> {
        let path = self.learning_path(learning.session_id);
        Self::write_json(&path, learning).await?;
        debug!(session_id = %learning.session_id, "learning persisted");
        Ok(())
    }

    async fn list_learnings(&self) -> HealResult<Vec<SessionLearning>> {
        let mut learnings: Vec<SessionLearning> = Self::read_dir_json(&self.learnings_dir()).await?;
        learnings.sort_by(|a, b| b.analyzed_at.cmp(&a.analyzed_at));
        Ok(learnings)
    }

    async fn append_task_record(&self, record: &TaskRecord) -> HealResult<()> {
        fs::create_dir_all(&self.root).await?;

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.tasks_path())
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
