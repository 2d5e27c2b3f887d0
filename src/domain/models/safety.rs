//! Safety rules and assessments.
//!
//! A [`RuleSet`] is an explicitly constructed, ordered, immutable value that
//! is handed to the policy engine at construction time. Rules never live in
//! global state, so tests can substitute custom rule sets.

use serde::{Deserialize, Serialize};

use super::pattern::HealingPattern;

/// How safe it is to act on a pattern without human review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    /// A safe rule matched and nothing overrode it.
    High,
    /// Reviewable: business logic involved or the detection is not trusted.
    Medium,
    /// Dangerous territory or no rule matched at all.
    Low,
}

impl std::fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(s)
    }
}

/// The three mutually exclusive rule buckets, in strict precedence order:
/// dangerous beats business-logic beats safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleClass {
    Dangerous,
    BusinessLogic,
    Safe,
}

/// A single immutable safety rule.
///
/// A rule matches when any of its keywords appears (case-insensitively) in
/// the pattern's common error, one of its implicated files, or the healing
/// target identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SafetyRule {
    /// Stable rule name, recorded in assessments.
    pub name: String,

    /// Which bucket this rule belongs to.
    pub class: RuleClass,

    /// Order within the bucket; lower evaluates first.
    pub priority: u8,

    /// Lowercase keywords to match against error text, files, and target.
    pub keywords: Vec<String>,

    /// Human-readable reason reported when the rule triggers.
    pub reason: String,
}

impl SafetyRule {
    pub fn new(
        name: impl Into<String>,
        class: RuleClass,
        priority: u8,
        keywords: &[&str],
        reason: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            class,
            priority,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            reason: reason.into(),
        }
    }

    /// Check this rule against a pattern and optional target identifier.
    pub fn matches(&self, pattern: &HealingPattern, target: Option<&str>) -> bool {
        let mut haystack = pattern.common_error.to_lowercase();
        for file in &pattern.files {
            haystack.push('\n');
            haystack.push_str(&file.to_lowercase());
        }
        if let Some(target) = target {
            haystack.push('\n');
            haystack.push_str(&target.to_lowercase());
        }

        self.keywords.iter().any(|k| haystack.contains(k))
    }
}

/// An ordered, immutable collection of safety rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSet {
    rules: Vec<SafetyRule>,
}

impl RuleSet {
    /// Build a rule set from explicit rules. Evaluation order within each
    /// bucket follows rule priority, so insertion order does not matter.
    pub fn new(mut rules: Vec<SafetyRule>) -> Self {
        rules.sort_by_key(|r| r.priority);
        Self { rules }
    }

    /// Rules of one bucket, in priority order.
    pub fn bucket(&self, class: RuleClass) -> impl Iterator<Item = &SafetyRule> {
        self.rules.iter().filter(move |r| r.class == class)
    }

    /// Total number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The built-in rule set.
    ///
    /// Dangerous rules cover authentication, payment, financial calculation,
    /// and personal-data handling: these always classify as dangerous no
    /// matter how the failure is worded elsewhere. Business-logic rules cover
    /// valuation, compliance scheduling, and risk scoring. Safe rules cover
    /// reference data, fixtures, selectors, timing, styling, and prop shapes.
    pub fn builtin() -> Self {
        Self::new(vec![
            // Dangerous: never auto-healable.
            SafetyRule::new(
                "auth-handling",
                RuleClass::Dangerous,
                10,
                &[
                    "auth",
                    "login",
                    "logout",
                    "password",
                    "credential",
                    "token",
                    "session",
                ],
                "touches authentication or session handling",
            ),
            SafetyRule::new(
                "payment-flow",
                RuleClass::Dangerous,
                20,
                &["payment", "billing", "invoice", "checkout", "stripe"],
                "touches payment or billing flows",
            ),
            SafetyRule::new(
                "financial-calculation",
                RuleClass::Dangerous,
                30,
                &["commission", "payout", "provision", "fee", "tax"],
                "touches financial or commission calculations",
            ),
            SafetyRule::new(
                "personal-data",
                RuleClass::Dangerous,
                40,
                &["personal-data", "gdpr", "privacy", "pii", "consent"],
                "touches raw personal-data handling",
            ),
            // Business logic: reviewable, never auto-healable.
            SafetyRule::new(
                "valuation-logic",
                RuleClass::BusinessLogic,
                10,
                &["valuation", "appraisal", "price-estimate", "market-value"],
                "valuation logic requires domain review",
            ),
            SafetyRule::new(
                "compliance-scheduling",
                RuleClass::BusinessLogic,
                20,
                &[
                    "maintenance-schedule",
                    "inspection-due",
                    "compliance",
                    "legal-deadline",
                ],
                "maintenance or legal-compliance scheduling requires review",
            ),
            SafetyRule::new(
                "risk-scoring",
                RuleClass::BusinessLogic,
                30,
                &["risk-score", "risk-rating", "scoring-model"],
                "risk-scoring logic requires review",
            ),
            // Safe: auto-healable when confidence holds up.
            SafetyRule::new(
                "reference-data-update",
                RuleClass::Safe,
                10,
                &["interval-constant", "reference-data", "lookup-table"],
                "standardized reference-data update",
            ),
            SafetyRule::new(
                "test-fixture",
                RuleClass::Safe,
                20,
                &["fixture", "snapshot", "mock-data", "test-data", "seed"],
                "test fixture or snapshot update",
            ),
            SafetyRule::new(
                "ui-selector",
                RuleClass::Safe,
                30,
                &["selector", "data-testid", "locator", "aria-label"],
                "UI selector or locator update",
            ),
            SafetyRule::new(
                "timing-adjustment",
                RuleClass::Safe,
                40,
                &["timeout", "waitfor", "debounce", "polling", "flaky"],
                "timing or wait-condition adjustment",
            ),
            SafetyRule::new(
                "styling",
                RuleClass::Safe,
                50,
                &["css", "style", "classname", "tailwind"],
                "styling-only change",
            ),
            SafetyRule::new(
                "prop-shape",
                RuleClass::Safe,
                60,
                &["prop", "proptypes", "interface-shape", "optional-field"],
                "prop-shape change without behavior impact",
            ),
        ])
    }
}

/// The outcome of running a pattern through the policy engine.
///
/// Derived deterministically from a pattern plus a rule set; recomputed every
/// iteration and persisted only as part of its session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SafetyAssessment {
    /// Overall safety classification.
    pub level: SafetyLevel,

    /// Whether the fix may be applied without human review.
    pub auto_heal_allowed: bool,

    /// Human-readable reason for the classification.
    pub reason: String,

    /// Names of the rules (and gates) that produced this outcome.
    pub triggered_rules: Vec<String>,
}
