//! Learnings analysis and aggregation commands.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use tracing::warn;

use crate::cli::commands::sessions::resolve_session;
use crate::cli::output::progress::{create_progress_bar, ProgressBarExt};
use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{AggregateReport, SessionLearning, TaskSuggestion};
use crate::domain::ports::{IssueTracker, NewIssue, SessionStore, TaskRecord};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::store::FsSessionStore;
use crate::infrastructure::tracker::LinearTracker;
use crate::services::LearningsAggregator;

#[derive(Args, Debug)]
pub struct LearningsArgs {
    #[command(subcommand)]
    pub command: LearningsCommands,
}

#[derive(Subcommand, Debug)]
pub enum LearningsCommands {
    /// Derive learnings from persisted sessions and store them
    Analyze {
        /// Session ID (full UUID or unique prefix); omit to analyze every session
        id: Option<String>,
    },
    /// Rank suggestions across all stored learnings
    Aggregate {
        /// File the ranked suggestions with the issue tracker
        #[arg(long)]
        publish: bool,

        /// Tracker team key (overrides tracker.team from config)
        #[arg(long)]
        team: Option<String>,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct AnalyzeOutput {
    pub analyzed: usize,
    pub learnings: Vec<SessionLearning>,
}

impl CommandOutput for AnalyzeOutput {
    fn to_human(&self) -> String {
        if self.learnings.is_empty() {
            return "No sessions to analyze.".to_string();
        }

        let mut lines = vec![format!("Analyzed {} session(s).\n", self.analyzed)];
        for learning in &self.learnings {
            lines.push(format!(
                "Session {}: {} suggestion(s), {} recurring error(s), {} refactor candidate(s)",
                &learning.session_id.to_string()[..8],
                learning.suggestions.len(),
                learning.recurring_errors.len(),
                learning.refactor_candidates.len()
            ));
        }

        if let [learning] = self.learnings.as_slice() {
            if !learning.suggestions.is_empty() {
                lines.push("\nSuggestions:".to_string());
                for suggestion in &learning.suggestions {
                    lines.push(format!("  P{} {}", suggestion.priority, suggestion.title));
                }
            }
            for gap in &learning.coverage_gaps {
                lines.push(format!("\nCoverage gap: {gap}"));
            }
        }

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct AggregateOutput {
    pub report: AggregateReport,
    pub published: Vec<PublishedIssue>,
    pub publish_failures: Vec<PublishFailure>,
}

#[derive(Debug, serde::Serialize)]
pub struct PublishedIssue {
    pub title: String,
    pub identifier: String,
    pub url: String,
}

#[derive(Debug, serde::Serialize)]
pub struct PublishFailure {
    pub title: String,
    pub error: String,
}

impl CommandOutput for AggregateOutput {
    fn to_human(&self) -> String {
        if self.report.sessions_analyzed == 0 {
            return "No learnings recorded. Run 'suture learnings analyze' first.".to_string();
        }
        if self.report.ranked.is_empty() {
            return format!(
                "No suggestions across {} learning(s).",
                self.report.sessions_analyzed
            );
        }

        let table = TableFormatter::new().format_suggestions(&self.report.ranked);
        let mut lines = vec![format!(
            "{table}\n{} suggestion(s) across {} learning(s)",
            self.report.ranked.len(),
            self.report.sessions_analyzed
        )];

        for issue in &self.published {
            lines.push(format!("✓ filed {}: {}", issue.identifier, issue.url));
        }
        for failure in &self.publish_failures {
            lines.push(format!("✗ could not file '{}': {}", failure.title, failure.error));
        }

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: LearningsArgs, json_mode: bool) -> Result<()> {
    let config = ConfigLoader::load().context("Failed to load configuration")?;
    let store = FsSessionStore::new(&config.storage.root);
    let aggregator = LearningsAggregator::new();

    match args.command {
        LearningsCommands::Analyze { id } => {
            let sessions = match id {
                Some(id) => vec![resolve_session(&store, &id).await?],
                None => store.list_sessions().await?,
            };

            let mut learnings = Vec::with_capacity(sessions.len());
            for session in &sessions {
                let learning = aggregator.analyze(session);
                store.save_learning(&learning).await?;
                learnings.push(learning);
            }

            let out = AnalyzeOutput {
                analyzed: learnings.len(),
                learnings,
            };
            output(&out, json_mode);
        }

        LearningsCommands::Aggregate { publish, team } => {
            let learnings = store.list_learnings().await?;
            let report = aggregator.aggregate(&learnings);

            let (published, publish_failures) = if publish && !report.ranked.is_empty() {
                let mut tracker_config = config.tracker.clone();
                tracker_config.enabled = true;
                if team.is_some() {
                    tracker_config.team = team;
                }
                let team = tracker_config
                    .team
                    .clone()
                    .ok_or_else(|| anyhow!("Team key required: pass --team or set tracker.team"))?;
                let tracker = LinearTracker::from_config(&tracker_config)?
                    .ok_or_else(|| anyhow!("Tracker is not configured"))?;

                publish_suggestions(&tracker, &store, &team, &report, json_mode).await
            } else {
                (vec![], vec![])
            };

            let out = AggregateOutput {
                report,
                published,
                publish_failures,
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}

/// File every ranked suggestion as a tracker issue.
///
/// Failures never abort the batch and nothing applied to code is ever
/// touched here; an issue that was created but could not be cross-logged
/// still counts as published.
async fn publish_suggestions(
    tracker: &LinearTracker,
    store: &FsSessionStore,
    team: &str,
    report: &AggregateReport,
    json_mode: bool,
) -> (Vec<PublishedIssue>, Vec<PublishFailure>) {
    let bar = (!json_mode).then(|| create_progress_bar(report.ranked.len() as u64));
    let mut published = Vec::new();
    let mut failures = Vec::new();

    for entry in &report.ranked {
        let suggestion = &entry.suggestion;
        if let Some(bar) = &bar {
            bar.set_message(suggestion.title.clone());
        }

        let result = file_issue(tracker, team, suggestion).await;
        match result {
            Ok(created) => {
                let record = TaskRecord {
                    created_at: Utc::now(),
                    title: suggestion.title.clone(),
                    issue_id: created.id.clone(),
                    url: created.url.clone(),
                };
                if let Err(err) = store.append_task_record(&record).await {
                    warn!(issue = %created.id, error = %err, "issue created but not cross-logged");
                }
                published.push(PublishedIssue {
                    title: suggestion.title.clone(),
                    identifier: created.id,
                    url: created.url,
                });
            }
            Err(err) => {
                warn!(title = %suggestion.title, error = %err, "suggestion not filed");
                failures.push(PublishFailure {
                    title: suggestion.title.clone(),
                    error: err.to_string(),
                });
            }
        }
        if let Some(bar) = &bar {
            bar.inc(1);
        }
    }

    if let Some(bar) = bar {
        if failures.is_empty() {
            bar.finish_success(format!("{} issue(s) filed", published.len()));
        } else {
            bar.finish_error(format!("{} of {} failed", failures.len(), report.ranked.len()));
        }
    }

    (published, failures)
}

async fn file_issue(
    tracker: &LinearTracker,
    team: &str,
    suggestion: &TaskSuggestion,
) -> Result<crate::domain::ports::CreatedIssue> {
    let label_ids = tracker.ensure_labels(team, &suggestion.labels).await?;
    let issue = NewIssue {
        title: suggestion.title.clone(),
        description: issue_description(suggestion),
        team: team.to_string(),
        priority: suggestion.priority,
        label_ids,
    };
    Ok(tracker.create_issue(&issue).await?)
}

fn issue_description(suggestion: &TaskSuggestion) -> String {
    format!(
        "{}\n\n**Reasoning:** {}\n**Estimated effort:** {}",
        suggestion.description, suggestion.reasoning, suggestion.estimated_effort
    )
}
