//! Safety policy enforcement for healing decisions.
//!
//! Classifies a detected pattern against an ordered rule set before any fix
//! may be applied. Evaluation is strictly conservative: dangerous rules are
//! checked first and terminate immediately, and nothing later in the
//! pipeline can upgrade a dangerous classification.

use tracing::debug;

use crate::domain::models::{
    HealingPattern, RuleClass, RuleSet, SafetyAssessment, SafetyLevel, SafetyRule,
};

/// Patterns below this confidence are never auto-healable, whatever the
/// rule match said.
pub const LOW_CONFIDENCE_FLOOR: f64 = 0.7;

/// Evaluates healing patterns against a rule set.
///
/// The rule set is injected at construction so tests can substitute their
/// own tables; production wiring uses [`RuleSet::builtin`].
pub struct SafetyPolicyEngine {
    rules: RuleSet,
}

impl SafetyPolicyEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Engine backed by the built-in rule table.
    pub fn with_builtin_rules() -> Self {
        Self::new(RuleSet::builtin())
    }

    /// Assess a pattern, optionally scoped to a healing target identifier.
    ///
    /// Bucket precedence: dangerous, then business-logic, then safe. A
    /// dangerous match terminates evaluation; the confidence floor applies
    /// to every other outcome that matched a rule.
    pub fn assess(&self, pattern: &HealingPattern, target: Option<&str>) -> SafetyAssessment {
        if let Some(rule) = self.first_match(RuleClass::Dangerous, pattern, target) {
            debug!(rule = %rule.name, "dangerous rule matched");
            return SafetyAssessment {
                level: SafetyLevel::Low,
                auto_heal_allowed: false,
                reason: rule.reason.clone(),
                triggered_rules: vec![rule.name.clone()],
            };
        }

        let matched = self
            .first_match(RuleClass::BusinessLogic, pattern, target)
            .map(|rule| {
                (
                    SafetyAssessment {
                        level: SafetyLevel::Medium,
                        auto_heal_allowed: false,
                        reason: rule.reason.clone(),
                        triggered_rules: vec![rule.name.clone()],
                    },
                    rule,
                )
            })
            .or_else(|| {
                self.first_match(RuleClass::Safe, pattern, target).map(|rule| {
                    (
                        SafetyAssessment {
                            level: SafetyLevel::High,
                            auto_heal_allowed: true,
                            reason: rule.reason.clone(),
                            triggered_rules: vec![rule.name.clone()],
                        },
                        rule,
                    )
                })
            });

        let Some((mut assessment, rule)) = matched else {
            return SafetyAssessment {
                level: SafetyLevel::Low,
                auto_heal_allowed: false,
                reason: "no matching rule - manual review required".to_string(),
                triggered_rules: Vec::new(),
            };
        };

        if pattern.confidence < LOW_CONFIDENCE_FLOOR {
            debug!(
                rule = %rule.name,
                confidence = pattern.confidence,
                "confidence below floor, forcing manual review"
            );
            assessment.level = SafetyLevel::Medium;
            assessment.auto_heal_allowed = false;
            assessment.reason = "low confidence".to_string();
            assessment.triggered_rules.push("low-confidence".to_string());
        }

        assessment
    }

    fn first_match(
        &self,
        class: RuleClass,
        pattern: &HealingPattern,
        target: Option<&str>,
    ) -> Option<&SafetyRule> {
        self.rules.bucket(class).find(|rule| rule.matches(pattern, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{PatternKind, SafetyRule};

    fn pattern(error: &str, confidence: f64) -> HealingPattern {
        HealingPattern {
            kind: PatternKind::Unknown,
            confidence,
            affected_tests: vec!["t".to_string()],
            common_error: error.to_string(),
            suggested_fix: String::new(),
            files: vec![],
        }
    }

    #[test]
    fn test_dangerous_always_wins_over_safe() {
        let engine = SafetyPolicyEngine::with_builtin_rules();
        // "login" hits the dangerous auth rule, "selector" the safe UI rule.
        let assessment = engine.assess(&pattern("login page selector changed", 1.0), None);

        assert_eq!(assessment.level, SafetyLevel::Low);
        assert!(!assessment.auto_heal_allowed);
        assert_eq!(assessment.triggered_rules, vec!["auth-handling"]);
    }

    #[test]
    fn test_dangerous_ignores_confidence_floor() {
        let engine = SafetyPolicyEngine::with_builtin_rules();
        let assessment = engine.assess(&pattern("payment checkout broke", 0.2), None);

        assert_eq!(assessment.level, SafetyLevel::Low);
        assert!(!assessment.auto_heal_allowed);
        // The dangerous reason survives; the floor never rewrites it.
        assert_eq!(assessment.triggered_rules, vec!["payment-flow"]);
        assert_ne!(assessment.reason, "low confidence");
    }

    #[test]
    fn test_business_logic_is_reviewable() {
        let engine = SafetyPolicyEngine::with_builtin_rules();
        let assessment = engine.assess(&pattern("valuation model returned stale result", 0.9), None);

        assert_eq!(assessment.level, SafetyLevel::Medium);
        assert!(!assessment.auto_heal_allowed);
        assert_eq!(assessment.triggered_rules, vec!["valuation-logic"]);
    }

    #[test]
    fn test_safe_rule_allows_auto_heal() {
        let engine = SafetyPolicyEngine::with_builtin_rules();
        let assessment = engine.assess(&pattern("element selector changed in header", 0.9), None);

        assert_eq!(assessment.level, SafetyLevel::High);
        assert!(assessment.auto_heal_allowed);
        assert_eq!(assessment.triggered_rules, vec!["ui-selector"]);
    }

    #[test]
    fn test_low_confidence_forces_manual_review() {
        let engine = SafetyPolicyEngine::with_builtin_rules();
        let assessment = engine.assess(&pattern("element selector changed in header", 0.6), None);

        assert_eq!(assessment.level, SafetyLevel::Medium);
        assert!(!assessment.auto_heal_allowed);
        assert_eq!(assessment.reason, "low confidence");
        assert!(assessment.triggered_rules.contains(&"ui-selector".to_string()));
        assert!(assessment.triggered_rules.contains(&"low-confidence".to_string()));
    }

    #[test]
    fn test_no_match_requires_manual_review() {
        let engine = SafetyPolicyEngine::with_builtin_rules();
        let assessment = engine.assess(&pattern("entirely novel breakage", 0.95), None);

        assert_eq!(assessment.level, SafetyLevel::Low);
        assert!(!assessment.auto_heal_allowed);
        assert!(assessment.reason.contains("no matching rule"));
        assert!(assessment.triggered_rules.is_empty());
    }

    #[test]
    fn test_no_match_with_low_confidence_stays_low() {
        let engine = SafetyPolicyEngine::with_builtin_rules();
        let assessment = engine.assess(&pattern("entirely novel breakage", 0.2), None);

        // The floor only rewrites rule matches; unmatched patterns already
        // sit at the most conservative level.
        assert_eq!(assessment.level, SafetyLevel::Low);
        assert!(!assessment.auto_heal_allowed);
    }

    #[test]
    fn test_target_participates_in_matching() {
        let engine = SafetyPolicyEngine::with_builtin_rules();
        let assessment = engine.assess(
            &pattern("expected 2 to equal 3", 0.9),
            Some("tests/billing/Invoice.test.ts"),
        );

        assert_eq!(assessment.triggered_rules, vec!["payment-flow"]);
        assert!(!assessment.auto_heal_allowed);
    }

    #[test]
    fn test_custom_rule_set_injection() {
        let rules = RuleSet::new(vec![SafetyRule::new(
            "only-rule",
            RuleClass::Safe,
            1,
            &["special"],
            "clear to proceed",
        )]);
        let engine = SafetyPolicyEngine::new(rules);

        let assessment = engine.assess(&pattern("a special case", 0.9), None);
        assert!(assessment.auto_heal_allowed);
        assert_eq!(assessment.triggered_rules, vec!["only-rule"]);

        let assessment = engine.assess(&pattern("login broke", 0.9), None);
        assert!(!assessment.auto_heal_allowed, "custom set has no dangerous rules but also no match");
    }
}
