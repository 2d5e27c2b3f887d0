//! Healing sessions: one bounded, iterative run from first test execution to
//! termination.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::failure::TestFailure;
use super::pattern::HealingPattern;
use super::safety::SafetyAssessment;
use super::strategy::FixStrategy;

/// How the controller decides whether to apply a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMode {
    /// Always ask a human before each change.
    Interactive,
    /// Apply only when the safety gate passes; never prompt.
    Auto,
    /// Bypass the safety gate entirely. Separately audited, never a default.
    Force,
    /// Report what would happen; never write a file.
    DryRun,
}

impl std::fmt::Display for DecisionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Interactive => "interactive",
            Self::Auto => "auto",
            Self::Force => "force",
            Self::DryRun => "dry-run",
        };
        f.write_str(s)
    }
}

impl DecisionMode {
    /// Parse a mode name as written on the command line.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "interactive" => Some(Self::Interactive),
            "auto" => Some(Self::Auto),
            "force" => Some(Self::Force),
            "dry-run" | "dryrun" => Some(Self::DryRun),
            _ => None,
        }
    }
}

/// Terminal state of a healing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// The suite passed on the very first run; nothing to heal.
    NoFailures,
    /// The suite passed after at least one healing iteration.
    Healed,
    /// The iteration budget ran out with tests still failing.
    MaxIterationsReached,
    /// The policy (or absence of an actionable strategy) requires a human.
    ManualReviewRequired,
    /// Dry-run reporting pass finished; no files were written.
    DryRunComplete,
    /// A quit signal or reviewer quit ended the run early.
    Cancelled,
}

impl std::fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NoFailures => "no failures",
            Self::Healed => "healed",
            Self::MaxIterationsReached => "max iterations reached",
            Self::ManualReviewRequired => "manual review required",
            Self::DryRunComplete => "dry-run complete",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Per-change apply result, recorded regardless of success so partial
/// failures stay visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AppliedChange {
    /// File the change targeted.
    pub file: PathBuf,

    /// Whether the new content was written.
    pub success: bool,

    /// Failure detail when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AppliedChange {
    pub fn ok(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(file: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// One healing run, created at start, mutated throughout, persisted keyed by
/// `session_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HealingSession {
    /// Stable identifier; also the persistence key.
    pub session_id: Uuid,

    /// When the session started.
    pub started_at: DateTime<Utc>,

    /// When the session reached a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Optional test file or directory this session was scoped to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Decision mode the session ran under.
    pub mode: DecisionMode,

    /// Every failure observed, across all iterations.
    pub failures: Vec<TestFailure>,

    /// One pattern per detection pass.
    pub patterns: Vec<HealingPattern>,

    /// One assessment per detection pass.
    pub assessments: Vec<SafetyAssessment>,

    /// The strategy chosen in the most recent iteration, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_strategy: Option<FixStrategy>,

    /// Per-change apply results, in application order.
    pub applied_changes: Vec<AppliedChange>,

    /// Number of completed re-run cycles.
    pub iteration: u32,

    /// Upper bound on re-run cycles; the loop never exceeds it.
    pub max_iterations: u32,

    /// Terminal state, set when the session finishes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SessionOutcome>,
}

impl HealingSession {
    /// Start a new session.
    pub fn new(mode: DecisionMode, target: Option<String>, max_iterations: u32) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            target,
            mode,
            failures: Vec::new(),
            patterns: Vec::new(),
            assessments: Vec::new(),
            selected_strategy: None,
            applied_changes: Vec::new(),
            iteration: 0,
            max_iterations,
            outcome: None,
        }
    }

    /// Mark the session terminal with the given outcome.
    pub fn finish(&mut self, outcome: SessionOutcome) {
        self.outcome = Some(outcome);
        self.finished_at = Some(Utc::now());
    }

    /// Whether the iteration budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.iteration >= self.max_iterations
    }

    /// Number of changes that were actually written.
    pub fn changes_applied(&self) -> usize {
        self.applied_changes.iter().filter(|c| c.success).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults() {
        let session = HealingSession::new(DecisionMode::Auto, Some("a.test.ts".into()), 3);
        assert_eq!(session.iteration, 0);
        assert_eq!(session.max_iterations, 3);
        assert!(session.outcome.is_none());
        assert!(session.finished_at.is_none());
        assert!(!session.is_exhausted());
    }

    #[test]
    fn test_mode_from_str_roundtrips_display() {
        for mode in [
            DecisionMode::Interactive,
            DecisionMode::Auto,
            DecisionMode::Force,
            DecisionMode::DryRun,
        ] {
            assert_eq!(DecisionMode::from_str(&mode.to_string()), Some(mode));
        }
        assert_eq!(DecisionMode::from_str("yolo"), None);
    }

    #[test]
    fn test_finish_sets_outcome_and_timestamp() {
        let mut session = HealingSession::new(DecisionMode::Interactive, None, 3);
        session.finish(SessionOutcome::Healed);
        assert_eq!(session.outcome, Some(SessionOutcome::Healed));
        assert!(session.finished_at.is_some());
    }

    #[test]
    fn test_exhaustion_bound() {
        let mut session = HealingSession::new(DecisionMode::Auto, None, 2);
        session.iteration = 1;
        assert!(!session.is_exhausted());
        session.iteration = 2;
        assert!(session.is_exhausted());
    }

    #[test]
    fn test_changes_applied_counts_successes_only() {
        let mut session = HealingSession::new(DecisionMode::Force, None, 3);
        session.applied_changes.push(AppliedChange::ok("a.ts"));
        session
            .applied_changes
            .push(AppliedChange::failed("b.ts", "snippet not found"));
        session.applied_changes.push(AppliedChange::ok("c.ts"));
        assert_eq!(session.changes_applied(), 2);
    }

    #[test]
    fn test_session_roundtrip_preserves_counts() {
        let mut session = HealingSession::new(DecisionMode::Auto, Some("t".into()), 3);
        session.iteration = 2;
        session.failures.push(TestFailure::new("t1", "boom", "at x"));
        session.applied_changes.push(AppliedChange::ok("src/a.ts"));
        session.finish(SessionOutcome::MaxIterationsReached);

        let json = serde_json::to_string_pretty(&session).unwrap();
        let back: HealingSession = serde_json::from_str(&json).unwrap();

        assert_eq!(back.session_id, session.session_id);
        assert_eq!(back.iteration, 2);
        assert_eq!(back.failures, session.failures);
        assert_eq!(back.applied_changes, session.applied_changes);
        assert_eq!(back.outcome, Some(SessionOutcome::MaxIterationsReached));
    }

    #[test]
    fn test_mode_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&DecisionMode::DryRun).unwrap(),
            "\"dry_run\""
        );
        assert_eq!(
            serde_json::to_string(&DecisionMode::Interactive).unwrap(),
            "\"interactive\""
        );
    }
}
