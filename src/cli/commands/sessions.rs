//! Session inspection commands.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::HealingSession;
use crate::domain::ports::SessionStore;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::store::FsSessionStore;

#[derive(Args, Debug)]
pub struct SessionsArgs {
    #[command(subcommand)]
    pub command: SessionsCommands,
}

#[derive(Subcommand, Debug)]
pub enum SessionsCommands {
    /// List persisted sessions, newest first
    List {
        /// Show at most this many sessions
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show one session in full
    Show {
        /// Session ID (full UUID or unique prefix)
        id: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct SessionListOutput {
    pub total: usize,
    pub sessions: Vec<HealingSession>,
}

impl CommandOutput for SessionListOutput {
    fn to_human(&self) -> String {
        if self.sessions.is_empty() {
            return "No sessions recorded.".to_string();
        }
        let table = TableFormatter::new().format_sessions(&self.sessions);
        format!("{table}\n{} session(s)", self.total)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SessionDetailOutput {
    pub session: HealingSession,
}

impl CommandOutput for SessionDetailOutput {
    fn to_human(&self) -> String {
        let s = &self.session;
        let mut lines = vec![
            format!("Session: {}", s.session_id),
            format!("Started: {}", s.started_at.format("%Y-%m-%d %H:%M:%S UTC")),
            format!("Mode: {}", s.mode),
            format!("Target: {}", s.target.as_deref().unwrap_or("<suite>")),
            format!("Iterations: {}/{}", s.iteration, s.max_iterations),
            format!(
                "Outcome: {}",
                s.outcome
                    .map_or_else(|| "in progress".to_string(), |o| o.to_string())
            ),
        ];

        if !s.failures.is_empty() {
            lines.push(format!("\nFailures observed ({}):", s.failures.len()));
            for failure in s.failures.iter().take(5) {
                lines.push(format!(
                    "  - {}: {}",
                    truncate(&failure.test_name, 40),
                    truncate(&failure.error_message, 60)
                ));
            }
            if s.failures.len() > 5 {
                lines.push(format!("  ... and {} more", s.failures.len() - 5));
            }
        }

        if let Some(pattern) = s.patterns.last() {
            lines.push(format!(
                "\nLast pattern: {} (confidence {:.2})",
                pattern.kind, pattern.confidence
            ));
        }
        if let Some(strategy) = &s.selected_strategy {
            lines.push(format!(
                "Strategy: {} ({} change(s))",
                strategy.name,
                strategy.changes.len()
            ));
        }

        if !s.applied_changes.is_empty() {
            lines.push(format!("\nApplied changes ({}):", s.applied_changes.len()));
            for change in &s.applied_changes {
                let marker = if change.success { "✓" } else { "✗" };
                let mut line = format!("  {marker} {}", change.file.display());
                if let Some(error) = &change.error {
                    line.push_str(&format!(" ({})", truncate(error, 50)));
                }
                lines.push(line);
            }
        }

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: SessionsArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;
    let store = FsSessionStore::new(&config.storage.root);

    match args.command {
        SessionsCommands::List { limit } => {
            let mut sessions = store.list_sessions().await?;
            let total = sessions.len();
            if let Some(limit) = limit {
                sessions.truncate(limit);
            }
            let out = SessionListOutput { total, sessions };
            output(&out, json_mode);
        }

        SessionsCommands::Show { id } => {
            let session = resolve_session(&store, &id).await?;
            let out = SessionDetailOutput { session };
            output(&out, json_mode);
        }
    }

    Ok(())
}

/// Load a session by full UUID or by unique prefix.
pub async fn resolve_session(store: &FsSessionStore, id: &str) -> Result<HealingSession> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        return Ok(store.load_session(uuid).await?);
    }

    let sessions = store.list_sessions().await?;
    let mut matches: Vec<HealingSession> = sessions
        .into_iter()
        .filter(|s| s.session_id.to_string().starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No session matching '{id}'"),
        1 => Ok(matches.remove(0)),
        n => bail!("Session prefix '{id}' is ambiguous ({n} matches)"),
    }
}
