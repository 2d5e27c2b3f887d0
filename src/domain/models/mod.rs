pub mod config;
pub mod failure;
pub mod learning;
pub mod pattern;
pub mod safety;
pub mod session;
pub mod strategy;

pub use config::{
    CompletionConfig, Config, HealingConfig, LoggingConfig, RetryConfig, RunnerConfig,
    StorageConfig, TrackerConfig,
};
pub use failure::TestFailure;
pub use learning::{
    AggregateReport, ErrorCategory, RankedSuggestion, RecurringError, RefactorCandidate,
    SessionLearning, TaskSuggestion,
};
pub use pattern::{HealingPattern, PatternKind};
pub use safety::{RuleClass, RuleSet, SafetyAssessment, SafetyLevel, SafetyRule};
pub use session::{AppliedChange, DecisionMode, HealingSession, SessionOutcome};
pub use strategy::{CodeChange, FixStrategy, RiskLevel};
