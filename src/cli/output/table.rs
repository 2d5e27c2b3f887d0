//! Table rendering for list commands.
//!
//! Sessions, aggregated suggestions, and pending backups all render through
//! one [`TableFormatter`] built on comfy-table: UTF-8 borders, dynamic
//! column sizing, color-coded outcome cells with icon fallbacks when colors
//! are off.

use std::env;
use std::path::{Path, PathBuf};

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

use crate::domain::models::{HealingSession, RankedSuggestion, SessionOutcome};

/// Shared table settings for every list command.
pub struct TableFormatter {
    use_colors: bool,
    max_width: Option<usize>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Formatter with explicit settings, for tests and piped output.
    pub fn with_config(use_colors: bool, max_width: Option<usize>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// One row per healing session, newest first as given.
    pub fn format_sessions(&self, sessions: &[HealingSession]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Started").add_attribute(Attribute::Bold),
            Cell::new("Mode").add_attribute(Attribute::Bold),
            Cell::new("Target").add_attribute(Attribute::Bold),
            Cell::new("Outcome").add_attribute(Attribute::Bold),
            Cell::new("Iterations").add_attribute(Attribute::Bold),
            Cell::new("Applied").add_attribute(Attribute::Bold),
        ]);

        for session in sessions {
            let id_short = &session.session_id.to_string()[..8];
            let started = session.started_at.format("%Y-%m-%d %H:%M").to_string();
            let target = session.target.as_deref().unwrap_or("<suite>");

            table.add_row(vec![
                Cell::new(id_short),
                Cell::new(started),
                Cell::new(session.mode.to_string()),
                Cell::new(truncate_text(target, 40)),
                self.outcome_cell(session.outcome),
                Cell::new(session.iteration.to_string()),
                Cell::new(session.changes_applied().to_string()),
            ]);
        }

        table.to_string()
    }

    /// Ranked task suggestions from an aggregate run.
    pub fn format_suggestions(&self, ranked: &[RankedSuggestion]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Seen").add_attribute(Attribute::Bold),
            Cell::new("Sessions").add_attribute(Attribute::Bold),
            Cell::new("Labels").add_attribute(Attribute::Bold),
        ]);

        for entry in ranked {
            let priority = format!("P{}", entry.suggestion.priority);
            let priority_cell = if self.use_colors {
                Cell::new(&priority).fg(priority_color(entry.suggestion.priority))
            } else {
                Cell::new(&priority)
            };
            let labels = if entry.suggestion.labels.is_empty() {
                "-".to_string()
            } else {
                entry.suggestion.labels.join(", ")
            };

            table.add_row(vec![
                priority_cell,
                Cell::new(truncate_text(&entry.suggestion.title, 50)),
                Cell::new(entry.occurrences.to_string()),
                Cell::new(entry.sessions_affected.to_string()),
                Cell::new(truncate_text(&labels, 30)),
            ]);
        }

        table.to_string()
    }

    /// Pending backup files paired with the originals they restore.
    pub fn format_backups(&self, backups: &[(PathBuf, PathBuf)]) -> String {
        let mut table = self.create_base_table();

        table.set_header(vec![
            Cell::new("Original").add_attribute(Attribute::Bold),
            Cell::new("Backup").add_attribute(Attribute::Bold),
        ]);

        for (original, backup) in backups {
            table.add_row(vec![
                Cell::new(display_path(original)),
                Cell::new(display_path(backup)),
            ]);
        }

        table.to_string()
    }

    fn outcome_cell(&self, outcome: Option<SessionOutcome>) -> Cell {
        let Some(outcome) = outcome else {
            return Cell::new("in progress");
        };
        if self.use_colors {
            Cell::new(outcome.to_string()).fg(outcome_color(outcome))
        } else {
            Cell::new(format!("{} {}", outcome_icon(outcome), outcome))
        }
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        if let Some(width) = self.max_width {
            table.set_width(width.try_into().unwrap_or(u16::MAX));
        }
        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Color output unless NO_COLOR is set or the terminal is dumb.
fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }
    true
}

fn outcome_color(outcome: SessionOutcome) -> Color {
    match outcome {
        SessionOutcome::Healed | SessionOutcome::NoFailures => Color::Green,
        SessionOutcome::MaxIterationsReached => Color::Red,
        SessionOutcome::ManualReviewRequired => Color::Yellow,
        SessionOutcome::DryRunComplete => Color::Cyan,
        SessionOutcome::Cancelled => Color::DarkGrey,
    }
}

fn outcome_icon(outcome: SessionOutcome) -> &'static str {
    match outcome {
        SessionOutcome::Healed | SessionOutcome::NoFailures => "✓",
        SessionOutcome::MaxIterationsReached => "✗",
        SessionOutcome::ManualReviewRequired => "⧗",
        SessionOutcome::DryRunComplete => "○",
        SessionOutcome::Cancelled => "⊘",
    }
}

fn priority_color(priority: u8) -> Color {
    match priority {
        1 => Color::Red,
        2 => Color::Yellow,
        3 => Color::White,
        _ => Color::DarkGrey,
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

/// Character-safe truncation with an ellipsis marker.
fn truncate_text(text: &str, max_len: usize) -> String {
    super::truncate(text, max_len)
}
