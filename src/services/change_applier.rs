//! Backup-before-write application of code changes.
//!
//! Applies a change as a controlled string substitution, never a diff: the
//! old content is expected to be an exact snippet previously read from the
//! file. Every write is preceded by a backup copy at the original path plus
//! a reserved suffix, which is the sole rollback mechanism. Apply failures
//! are captured into the result record, not raised, so one bad change never
//! aborts its siblings.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{info, warn};

use crate::domain::models::{AppliedChange, CodeChange};
use crate::domain::{HealError, HealResult};

/// Applies and rolls back individual code changes.
pub struct ChangeApplier {
    backup_suffix: String,
}

impl ChangeApplier {
    /// `backup_suffix` is the reserved file-name suffix marking backups,
    /// e.g. `.backup`.
    pub fn new(backup_suffix: impl Into<String>) -> Self {
        Self {
            backup_suffix: backup_suffix.into(),
        }
    }

    /// Backup location for a file: the same path with the suffix appended.
    pub fn backup_path(&self, file: &Path) -> PathBuf {
        let mut name = file.file_name().map_or_else(OsString::new, ToOwned::to_owned);
        name.push(self.backup_suffix.as_str());
        file.with_file_name(name)
    }

    /// Recover the original path a backup belongs to, if the name carries
    /// the backup suffix.
    pub fn original_path(&self, backup: &Path) -> Option<PathBuf> {
        let name = backup.file_name()?.to_str()?;
        let stem = name.strip_suffix(self.backup_suffix.as_str())?;
        if stem.is_empty() {
            return None;
        }
        Some(backup.with_file_name(stem))
    }

    /// Apply one change: read, back up, substitute, write.
    ///
    /// Failures are captured in the returned record. A read failure leaves
    /// no side effects; once the backup exists it is kept on every later
    /// failure so the caller can still roll back manually.
    pub async fn apply(&self, change: &CodeChange) -> AppliedChange {
        let file = &change.file;

        let current = match fs::read_to_string(file).await {
            Ok(content) => content,
            Err(err) => {
                warn!(file = %file.display(), error = %err, "apply aborted, file unreadable");
                return AppliedChange::failed(file, format!("read failed: {err}"));
            }
        };

        let backup = self.backup_path(file);
        if let Err(err) = fs::write(&backup, &current).await {
            warn!(file = %file.display(), error = %err, "apply aborted, backup not writable");
            return AppliedChange::failed(file, format!("backup failed: {err}"));
        }

        let updated = if change.is_whole_file() {
            change.new_content.clone()
        } else if current.contains(&change.old_content) {
            current.replacen(&change.old_content, &change.new_content, 1)
        } else {
            // The backup stays; restoring it is a harmless no-op.
            warn!(file = %file.display(), "apply aborted, old content not present");
            return AppliedChange::failed(file, "old content not found in file");
        };

        if let Err(err) = fs::write(file, updated).await {
            // Keep the backup so a manual rollback remains possible.
            warn!(file = %file.display(), error = %err, "write failed, backup retained");
            return AppliedChange::failed(file, format!("write failed: {err}"));
        }

        info!(file = %file.display(), "change applied");
        AppliedChange::ok(file)
    }

    /// Restore a file from its backup and consume the backup.
    ///
    /// One level of undo only: rolling back twice without an intervening
    /// apply fails with [`HealError::NoBackup`].
    pub async fn rollback(&self, file: &Path) -> HealResult<()> {
        let backup = self.backup_path(file);

        let content = match fs::read_to_string(&backup).await {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(HealError::NoBackup(file.to_path_buf()));
            }
            Err(err) => return Err(err.into()),
        };

        fs::write(file, content).await?;
        fs::remove_file(&backup).await?;
        info!(file = %file.display(), "rolled back from backup");
        Ok(())
    }

    /// All pending backups under `root`, recursively, sorted by path.
    ///
    /// Skips hidden directories, `node_modules`, and `target`. A missing
    /// root yields an empty list.
    pub async fn find_backups(&self, root: &Path) -> HealResult<Vec<PathBuf>> {
        let mut found = Vec::new();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    if !is_skipped_dir(&path) {
                        stack.push(path);
                    }
                } else if self.is_backup(&path) {
                    found.push(path);
                }
            }
        }

        found.sort();
        Ok(found)
    }

    fn is_backup(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(self.backup_suffix.as_str()))
    }
}

fn is_skipped_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') || n == "node_modules" || n == "target")
}
