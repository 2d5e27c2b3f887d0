pub mod change_applier;
pub mod failure_parser;
pub mod learnings;
pub mod pattern_detector;
pub mod safety;
pub mod strategy_generator;

pub use change_applier::ChangeApplier;
pub use failure_parser::FailureParser;
pub use learnings::LearningsAggregator;
pub use pattern_detector::PatternDetector;
pub use safety::SafetyPolicyEngine;
pub use strategy_generator::{select_strategy, StrategyGenerator};
