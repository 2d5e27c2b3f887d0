//! Healing patterns: the classification of a batch of failures.

use serde::{Deserialize, Serialize};

use super::failure::TestFailure;

/// Category a batch of test failures is classified into.
///
/// The wire format uses kebab-case (`library-upgrade`, `api-change`, ...) so
/// persisted sessions stay readable next to the detection responses they came
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternKind {
    /// A dependency was bumped and its API surface moved underneath the tests.
    LibraryUpgrade,
    /// A consumed endpoint or response schema changed.
    ApiChange,
    /// Internal restructuring left stale references behind.
    Refactoring,
    /// Fixtures, snapshots, or reference data are out of date.
    DataUpdate,
    /// Failures localized to a single component or view.
    ComponentSpecific,
    /// No recognizable category.
    Unknown,
}

impl PatternKind {
    /// Kebab-case name, matching the serialized form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LibraryUpgrade => "library-upgrade",
            Self::ApiChange => "api-change",
            Self::Refactoring => "refactoring",
            Self::DataUpdate => "data-update",
            Self::ComponentSpecific => "component-specific",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a kebab-case kind name; anything unrecognized maps to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "library-upgrade" => Self::LibraryUpgrade,
            "api-change" => Self::ApiChange,
            "refactoring" => Self::Refactoring,
            "data-update" => Self::DataUpdate,
            "component-specific" => Self::ComponentSpecific,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detection pass over a failure batch.
///
/// `confidence` is a heuristic ranking in `[0, 1]`, not the output of a
/// calibrated model; treat it as ordering information only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HealingPattern {
    /// Detected category.
    pub kind: PatternKind,

    /// Heuristic confidence score, clamped to `[0, 1]`.
    pub confidence: f64,

    /// Names of the tests this pattern covers.
    pub affected_tests: Vec<String>,

    /// The error text shared by (or representative of) the batch.
    pub common_error: String,

    /// Free-text description of the suggested remediation.
    pub suggested_fix: String,

    /// Source files implicated by the failures.
    pub files: Vec<String>,
}

impl HealingPattern {
    /// Build a pattern over a failure batch, clamping confidence to `[0, 1]`.
    pub fn new(kind: PatternKind, confidence: f64, failures: &[TestFailure]) -> Self {
        Self {
            kind,
            confidence: confidence.clamp(0.0, 1.0),
            affected_tests: failures.iter().map(|f| f.test_name.clone()).collect(),
            common_error: failures
                .first()
                .map(|f| f.error_message.clone())
                .unwrap_or_default(),
            suggested_fix: String::new(),
            files: collect_files(failures),
        }
    }

    /// The no-information pattern for a batch nothing matched.
    pub fn unknown(failures: &[TestFailure]) -> Self {
        Self::new(PatternKind::Unknown, 0.5, failures)
    }

    /// Set the suggested fix text.
    #[must_use]
    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.suggested_fix = fix.into();
        self
    }
}

/// Deduplicated source files across a failure batch, in first-seen order.
fn collect_files(failures: &[TestFailure]) -> Vec<String> {
    let mut files = Vec::new();
    for failure in failures {
        if let Some(file) = &failure.source_file {
            if !files.contains(file) {
                files.push(file.clone());
            }
        }
    }
    files
}
