//! CLI command implementations.

pub mod backups;
pub mod heal;
pub mod init;
pub mod learnings;
pub mod rollback;
pub mod sessions;
