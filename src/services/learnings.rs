//! Offline learning extraction from persisted sessions.
//!
//! A pure batch stage that runs after the fact, never inside the healing
//! loop: it reads persisted sessions, mutates nothing, and never calls the
//! completion service. Signals become task suggestions that a tracker
//! integration can publish.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::models::{
    AggregateReport, ErrorCategory, HealingSession, RankedSuggestion, RecurringError,
    RefactorCandidate, SessionLearning, SessionOutcome, TaskSuggestion,
};

/// Derives learnings from sessions and ranks suggestions across many.
#[derive(Debug, Default)]
pub struct LearningsAggregator;

impl LearningsAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Analyze one session into a learning record.
    pub fn analyze(&self, session: &HealingSession) -> SessionLearning {
        let refactor_candidates = refactor_candidates(session);
        let recurring_errors = recurring_errors(session);
        let coverage_gaps = coverage_gaps(session);
        let tech_debt = tech_debt(session);

        let mut suggestions = Vec::new();
        for candidate in &refactor_candidates {
            suggestions.push(TaskSuggestion {
                title: format!("Refactor {}", candidate.file),
                description: format!(
                    "{} was modified {} times while healing session {}; repeated churn \
                     suggests the file is carrying too many responsibilities.",
                    candidate.file, candidate.touch_count, session.session_id
                ),
                priority: 3,
                labels: vec!["tech-debt".to_string(), "test-healing".to_string()],
                reasoning: format!(
                    "same file touched {} times in one session",
                    candidate.touch_count
                ),
                estimated_effort: "medium".to_string(),
            });
        }
        for recurring in &recurring_errors {
            suggestions.push(TaskSuggestion {
                title: format!("Fix recurring {} failures", recurring.category),
                description: format!(
                    "{} failures in the {} category recurred within one session. \
                     Sample: {}",
                    recurring.count, recurring.category, recurring.sample
                ),
                priority: recurring.category.default_priority(),
                labels: vec!["test-healing".to_string(), recurring.category.as_str().to_string()],
                reasoning: format!("category recurred {} times", recurring.count),
                estimated_effort: if recurring.count > 3 { "large" } else { "small" }.to_string(),
            });
        }

        SessionLearning {
            session_id: session.session_id,
            analyzed_at: Utc::now(),
            refactor_candidates,
            recurring_errors,
            coverage_gaps,
            tech_debt,
            suggestions,
        }
    }

    /// Rank suggestions across many learnings.
    ///
    /// Suggestions are grouped by title; ranking orders by sessions
    /// affected, then total occurrences, then priority (urgent first).
    pub fn aggregate(&self, learnings: &[SessionLearning]) -> AggregateReport {
        let mut grouped: HashMap<&str, (TaskSuggestion, usize, Vec<Uuid>)> = HashMap::new();

        for learning in learnings {
            for suggestion in &learning.suggestions {
                let entry = grouped
                    .entry(suggestion.title.as_str())
                    .or_insert_with(|| (suggestion.clone(), 0, Vec::new()));
                entry.1 += 1;
                if !entry.2.contains(&learning.session_id) {
                    entry.2.push(learning.session_id);
                }
            }
        }

        let mut ranked: Vec<RankedSuggestion> = grouped
            .into_values()
            .map(|(suggestion, occurrences, sessions)| RankedSuggestion {
                suggestion,
                occurrences,
                sessions_affected: sessions.len(),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.sessions_affected
                .cmp(&a.sessions_affected)
                .then(b.occurrences.cmp(&a.occurrences))
                .then(a.suggestion.priority.cmp(&b.suggestion.priority))
                .then(a.suggestion.title.cmp(&b.suggestion.title))
        });

        AggregateReport {
            generated_at: Utc::now(),
            sessions_analyzed: learnings.len(),
            ranked,
        }
    }
}

/// Files successfully modified more than once, most-touched first.
fn refactor_candidates(session: &HealingSession) -> Vec<RefactorCandidate> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for change in &session.applied_changes {
        if change.success {
            *counts.entry(change.file.display().to_string()).or_insert(0) += 1;
        }
    }

    let mut candidates: Vec<RefactorCandidate> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(file, touch_count)| RefactorCandidate { file, touch_count })
        .collect();
    candidates.sort_by(|a, b| b.touch_count.cmp(&a.touch_count).then(a.file.cmp(&b.file)));
    candidates
}

/// Error categories appearing more than once, biggest bucket first.
fn recurring_errors(session: &HealingSession) -> Vec<RecurringError> {
    let mut buckets: HashMap<ErrorCategory, (usize, String)> = HashMap::new();
    for failure in &session.failures {
        let category = ErrorCategory::categorize(&failure.error_message);
        let entry = buckets
            .entry(category)
            .or_insert_with(|| (0, failure.error_message.clone()));
        entry.0 += 1;
    }

    let mut recurring: Vec<RecurringError> = buckets
        .into_iter()
        .filter(|(_, (count, _))| *count > 1)
        .map(|(category, (count, sample))| RecurringError {
            category,
            count,
            sample,
        })
        .collect();
    recurring.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });
    recurring
}

/// Tests whose failures never resolved to a source file.
fn coverage_gaps(session: &HealingSession) -> Vec<String> {
    let mut gaps = Vec::new();
    for failure in &session.failures {
        if failure.source_file.is_none() && !gaps.contains(&failure.test_name) {
            gaps.push(failure.test_name.clone());
        }
    }
    gaps
}

fn tech_debt(session: &HealingSession) -> Vec<String> {
    let mut debt = Vec::new();

    if session.outcome == Some(SessionOutcome::MaxIterationsReached) {
        debt.push(format!(
            "healing exhausted {} iterations without the suite converging",
            session.max_iterations
        ));
    }

    let failed = session.applied_changes.iter().filter(|c| !c.success).count();
    if failed > 0 {
        debt.push(format!("{failed} change application(s) failed and need manual follow-up"));
    }

    debt
}
