//! Domain errors for the Suture healing engine.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur during a healing run.
///
/// Failures local to a single code change are not represented here; they are
/// captured into the session's applied-change records so the run can continue.
/// These variants cover the failures that a caller must handle explicitly.
#[derive(Debug, Error)]
pub enum HealError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("No backup found for {}", .0.display())]
    NoBackup(PathBuf),

    #[error("Test command '{command}' could not be run: {reason}")]
    RunnerSpawn { command: String, reason: String },

    #[error("Test run timed out after {0}s")]
    RunnerTimeout(u64),

    #[error("Issue tracker error: {0}")]
    Tracker(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type HealResult<T> = Result<T, HealError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_backup_message_includes_path() {
        let err = HealError::NoBackup(PathBuf::from("src/auth.ts"));
        assert!(err.to_string().contains("src/auth.ts"));
    }

    #[test]
    fn test_io_error_converts() {
        fn read() -> HealResult<String> {
            let bytes = std::fs::read("/definitely/not/a/real/path/suture")?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        assert!(matches!(read(), Err(HealError::Io(_))));
    }

    #[test]
    fn test_serde_error_converts() {
        fn parse() -> HealResult<serde_json::Value> {
            let value = serde_json::from_str("not json")?;
            Ok(value)
        }
        assert!(matches!(parse(), Err(HealError::Serialization(_))));
    }
}
