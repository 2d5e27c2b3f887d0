//! Fix strategies and the code changes they bundle.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Risk rating of a candidate strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Parse a risk name; anything unrecognized maps to `Medium`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        };
        f.write_str(s)
    }
}

/// The atomic unit of modification: a controlled string substitution.
///
/// Applying a change replaces the first literal occurrence of `old_content`
/// in the file. An empty `old_content` means the file is written wholesale.
/// This is deliberately not diff/patch-based; the old content is expected to
/// be an exact snippet previously read from the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CodeChange {
    /// File the change targets.
    pub file: PathBuf,

    /// Exact snippet to replace; empty means replace the whole file.
    pub old_content: String,

    /// Replacement text.
    pub new_content: String,

    /// Why this change is proposed.
    pub reason: String,
}

impl CodeChange {
    pub fn new(
        file: impl Into<PathBuf>,
        old_content: impl Into<String>,
        new_content: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            old_content: old_content.into(),
            new_content: new_content.into(),
            reason: reason.into(),
        }
    }

    /// Whether this change rewrites the file wholesale.
    pub fn is_whole_file(&self) -> bool {
        self.old_content.is_empty()
    }
}

/// A named, risk-rated, mutually exclusive candidate fix.
///
/// Exactly one strategy is selected per iteration; selection is a separate
/// step from generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FixStrategy {
    /// Short strategy name (e.g. `conservative`).
    pub name: String,

    /// What the strategy does and what it touches.
    pub description: String,

    /// Risk rating used for ordering and selection.
    pub risk: RiskLevel,

    /// Rough effort estimate, free text.
    pub estimated_effort: String,

    /// Changes to apply, in order.
    pub changes: Vec<CodeChange>,
}

impl FixStrategy {
    /// A placeholder strategy with no concrete changes.
    ///
    /// Emitted when no completion service is reachable so callers always see
    /// the full risk spectrum; distinguishable from real candidates via
    /// [`is_actionable`](Self::is_actionable).
    pub fn stub(
        name: impl Into<String>,
        description: impl Into<String>,
        risk: RiskLevel,
        estimated_effort: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            risk,
            estimated_effort: estimated_effort.into(),
            changes: Vec::new(),
        }
    }

    /// Whether this strategy carries concrete changes that can be applied.
    pub fn is_actionable(&self) -> bool {
        !self.changes.is_empty()
    }
}
