//! Suture heals failing test suites.
//!
//! A healing run executes the configured test command, parses the failures,
//! classifies them into a healing pattern, and gates proposed fixes through
//! an ordered safety policy before any file is written. Writes always take
//! a backup first, the suite is re-run after every apply, and the whole
//! loop is bounded. Finished sessions persist as JSON and feed an offline
//! learnings pass that can file follow-up tasks with an issue tracker.
//!
//! # Architecture
//!
//! The crate follows Hexagonal Architecture:
//!
//! - **Domain Layer** (`domain`): models, ports, and the error taxonomy
//! - **Service Layer** (`services`): parsing, detection, safety, strategy
//!   generation, change application, learnings
//! - **Application Layer** (`application`): the session loop and batch runner
//! - **Infrastructure Layer** (`infrastructure`): subprocess runner,
//!   completion API client, file-system store, tracker client, terminal
//!   approval, config, logging
//! - **CLI Layer** (`cli`): the `suture` command surface

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{BatchHealer, SessionController};
pub use domain::errors::{HealError, HealResult};
pub use domain::models::{
    Config, DecisionMode, FixStrategy, HealingPattern, HealingSession, SafetyAssessment,
    SessionLearning, SessionOutcome, TestFailure,
};
pub use domain::ports::{
    ApprovalPort, CompletionClient, IssueTracker, SessionStore, TestRunner,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    ChangeApplier, FailureParser, LearningsAggregator, PatternDetector, SafetyPolicyEngine,
    StrategyGenerator,
};
