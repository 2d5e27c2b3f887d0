//! The healing session loop.
//!
//! One controller drives one session at a time through the fixed pipeline:
//! run tests, parse failures, detect a pattern, assess safety, decide,
//! apply, re-run. The loop is strictly sequential and bounded by the
//! session's iteration limit; a broadcast quit signal stops new prompts and
//! applies at the next safe point without interrupting an apply already in
//! flight.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::models::{
    AppliedChange, CodeChange, DecisionMode, HealingPattern, HealingSession, SafetyAssessment,
    SafetyLevel, SessionOutcome,
};
use crate::domain::ports::{
    ApprovalDecision, ApprovalPort, CompletionClient, SessionStore, TestRunner,
};
use crate::services::{
    select_strategy, ChangeApplier, FailureParser, PatternDetector, SafetyPolicyEngine,
    StrategyGenerator,
};

/// Confidence floor for the auto-heal gate. Stricter than the safety
/// engine's review floor: applying without a human needs more certainty
/// than merely classifying.
pub const AUTO_HEAL_CONFIDENCE: f64 = 0.9;

/// What the controller decided to do with the current iteration's strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Apply without asking; gate passed or force mode is on.
    AutoHeal,
    /// Ask a human per change before applying.
    NeedsApproval,
    /// Mode forbids prompting and the gate failed; report and stop.
    Denied,
    /// Dry run: record what would happen, write nothing.
    ReportOnly,
}

/// The central decision gate combining mode, pattern, and safety assessment.
///
/// Auto-heal requires high confidence, a high safety level, and an explicit
/// allow from the rule engine, all at once. Force mode bypasses the gate
/// entirely and is audited separately; interactive mode always asks.
pub fn decide(
    mode: DecisionMode,
    pattern: &HealingPattern,
    assessment: &SafetyAssessment,
) -> Decision {
    match mode {
        DecisionMode::DryRun => Decision::ReportOnly,
        DecisionMode::Force => Decision::AutoHeal,
        DecisionMode::Interactive => Decision::NeedsApproval,
        DecisionMode::Auto => {
            if pattern.confidence >= AUTO_HEAL_CONFIDENCE
                && assessment.level == SafetyLevel::High
                && assessment.auto_heal_allowed
            {
                Decision::AutoHeal
            } else {
                Decision::Denied
            }
        }
    }
}

/// Drives healing sessions end to end.
///
/// Ports are injected; the pipeline services are owned. A single controller
/// can run many sessions, but never two iterations of the same session
/// concurrently.
pub struct SessionController {
    runner: Arc<dyn TestRunner>,
    parser: FailureParser,
    detector: PatternDetector,
    safety: SafetyPolicyEngine,
    generator: StrategyGenerator,
    applier: ChangeApplier,
    approval: Arc<dyn ApprovalPort>,
    store: Arc<dyn SessionStore>,
    quit_tx: broadcast::Sender<()>,
}

impl SessionController {
    pub fn new(
        runner: Arc<dyn TestRunner>,
        approval: Arc<dyn ApprovalPort>,
        store: Arc<dyn SessionStore>,
        completion: Option<Arc<dyn CompletionClient>>,
        backup_suffix: &str,
    ) -> Self {
        let (quit_tx, _) = broadcast::channel(4);
        Self {
            runner,
            parser: FailureParser::new(),
            detector: PatternDetector::new(completion.clone()),
            safety: SafetyPolicyEngine::with_builtin_rules(),
            generator: StrategyGenerator::new(completion),
            applier: ChangeApplier::new(backup_suffix),
            approval,
            store,
            quit_tx,
        }
    }

    /// Sender half of the quit signal. Sending stops new prompts and new
    /// applies for every session wired to this controller.
    pub fn quit_handle(&self) -> broadcast::Sender<()> {
        self.quit_tx.clone()
    }

    /// The applier this controller writes through, for rollback tooling.
    pub fn applier(&self) -> &ChangeApplier {
        &self.applier
    }

    /// Run one full healing session.
    ///
    /// Errors are fatal conditions only: a runner that cannot execute or a
    /// session that cannot be persisted. Everything else is captured in the
    /// returned session's outcome and per-change records.
    pub async fn run(
        &self,
        mode: DecisionMode,
        target: Option<String>,
        max_iterations: u32,
    ) -> Result<HealingSession> {
        let mut session = HealingSession::new(mode, target.clone(), max_iterations);
        let mut quit_rx = self.quit_tx.subscribe();
        info!(
            session_id = %session.session_id,
            mode = %mode,
            target = target.as_deref().unwrap_or("<all>"),
            "healing session started"
        );

        let run = self
            .runner
            .run(target.as_deref())
            .await
            .context("initial test run failed")?;
        let mut failures = self.parser.parse(&run.output, run.passed);

        if failures.is_empty() {
            info!(session_id = %session.session_id, "no failures, nothing to heal");
            session.finish(SessionOutcome::NoFailures);
            self.persist(&session).await?;
            return Ok(session);
        }

        loop {
            session.failures.extend(failures.iter().cloned());

            if quit_requested(&mut quit_rx) {
                session.finish(SessionOutcome::Cancelled);
                break;
            }

            let pattern = self.detector.detect(&failures).await;
            let assessment = self.safety.assess(&pattern, target.as_deref());
            let decision = decide(mode, &pattern, &assessment);
            if mode == DecisionMode::Force {
                warn!(
                    session_id = %session.session_id,
                    level = %assessment.level,
                    "force mode bypasses the safety gate"
                );
            }
            info!(
                session_id = %session.session_id,
                iteration = session.iteration,
                kind = %pattern.kind,
                confidence = pattern.confidence,
                level = %assessment.level,
                ?decision,
                "iteration assessed"
            );
            session.patterns.push(pattern.clone());
            session.assessments.push(assessment.clone());

            let strategies = self.generator.generate(&failures, &pattern).await;
            let selected = select_strategy(&strategies).cloned();

            match decision {
                Decision::ReportOnly => {
                    session.selected_strategy = selected;
                    session.finish(SessionOutcome::DryRunComplete);
                    break;
                }
                Decision::Denied => {
                    info!(reason = %assessment.reason, "auto-heal gate denied, manual review required");
                    session.finish(SessionOutcome::ManualReviewRequired);
                    break;
                }
                Decision::AutoHeal | Decision::NeedsApproval => {
                    let Some(strategy) = selected else {
                        debug!("no actionable strategy, manual review required");
                        session.finish(SessionOutcome::ManualReviewRequired);
                        break;
                    };
                    session.selected_strategy = Some(strategy.clone());

                    let ask = decision == Decision::NeedsApproval;
                    if self
                        .apply_strategy(&strategy.changes, ask, &mut session, &mut quit_rx)
                        .await?
                    {
                        session.finish(SessionOutcome::Cancelled);
                        break;
                    }
                }
            }

            session.iteration += 1;
            self.persist(&session).await?;

            let run = self
                .runner
                .run(target.as_deref())
                .await
                .context("test re-run failed")?;
            failures = self.parser.parse(&run.output, run.passed);

            if failures.is_empty() {
                session.finish(SessionOutcome::Healed);
                break;
            }
            if session.is_exhausted() {
                session.finish(SessionOutcome::MaxIterationsReached);
                break;
            }
        }

        self.persist(&session).await?;
        let outcome = session
            .outcome
            .map_or_else(|| "unknown".to_string(), |o| o.to_string());
        info!(
            session_id = %session.session_id,
            outcome = %outcome,
            iterations = session.iteration,
            changes = session.applied_changes.len(),
            "healing session finished"
        );
        Ok(session)
    }

    /// Apply a strategy's changes in list order, recording every result.
    ///
    /// Returns `true` when a quit arrived. The quit check sits before each
    /// prompt and each apply; an apply that has started always completes so
    /// no file is left without its matching backup.
    async fn apply_strategy(
        &self,
        changes: &[CodeChange],
        ask: bool,
        session: &mut HealingSession,
        quit_rx: &mut broadcast::Receiver<()>,
    ) -> Result<bool> {
        for change in changes {
            if quit_requested(quit_rx) {
                return Ok(true);
            }

            if ask {
                match self.approval.request(change).await? {
                    ApprovalDecision::Approve => {}
                    ApprovalDecision::Reject => {
                        session
                            .applied_changes
                            .push(AppliedChange::failed(&change.file, "rejected by reviewer"));
                        continue;
                    }
                    ApprovalDecision::Quit => return Ok(true),
                }
            }

            let result = self.applier.apply(change).await;
            session.applied_changes.push(result);
        }
        Ok(false)
    }

    async fn persist(&self, session: &HealingSession) -> Result<()> {
        self.store
            .save_session(session)
            .await
            .context("failed to persist session")
    }
}

/// Non-blocking quit check. A lagged receiver still means someone quit.
pub(crate) fn quit_requested(rx: &mut broadcast::Receiver<()>) -> bool {
    !matches!(rx.try_recv(), Err(broadcast::error::TryRecvError::Empty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PatternKind;

    fn pattern(confidence: f64) -> HealingPattern {
        HealingPattern::new(PatternKind::DataUpdate, confidence, &[])
    }

    fn assessment(level: SafetyLevel, allowed: bool) -> SafetyAssessment {
        SafetyAssessment {
            level,
            auto_heal_allowed: allowed,
            reason: "test".to_string(),
            triggered_rules: vec![],
        }
    }

    #[test]
    fn test_auto_mode_gate_requires_all_three() {
        let high = assessment(SafetyLevel::High, true);

        assert_eq!(decide(DecisionMode::Auto, &pattern(0.95), &high), Decision::AutoHeal);
        // Confidence below the gate.
        assert_eq!(decide(DecisionMode::Auto, &pattern(0.85), &high), Decision::Denied);
        // Level not high.
        assert_eq!(
            decide(DecisionMode::Auto, &pattern(0.95), &assessment(SafetyLevel::Medium, true)),
            Decision::Denied
        );
        // Rule engine said no.
        assert_eq!(
            decide(DecisionMode::Auto, &pattern(0.95), &assessment(SafetyLevel::High, false)),
            Decision::Denied
        );
    }

    #[test]
    fn test_gate_boundary_is_inclusive() {
        let high = assessment(SafetyLevel::High, true);
        assert_eq!(decide(DecisionMode::Auto, &pattern(0.9), &high), Decision::AutoHeal);
    }

    #[test]
    fn test_interactive_always_asks() {
        // Even a gate-passing pattern prompts in interactive mode.
        let high = assessment(SafetyLevel::High, true);
        assert_eq!(
            decide(DecisionMode::Interactive, &pattern(0.99), &high),
            Decision::NeedsApproval
        );
        // And a dangerous one still asks rather than silently denying.
        assert_eq!(
            decide(DecisionMode::Interactive, &pattern(0.2), &assessment(SafetyLevel::Low, false)),
            Decision::NeedsApproval
        );
    }

    #[test]
    fn test_force_bypasses_gate() {
        let worst = assessment(SafetyLevel::Low, false);
        assert_eq!(decide(DecisionMode::Force, &pattern(0.1), &worst), Decision::AutoHeal);
    }

    #[test]
    fn test_dry_run_only_reports() {
        let high = assessment(SafetyLevel::High, true);
        assert_eq!(decide(DecisionMode::DryRun, &pattern(0.99), &high), Decision::ReportOnly);
    }

    #[test]
    fn test_quit_requested_consumes_signal() {
        let (tx, mut rx) = broadcast::channel(4);
        assert!(!quit_requested(&mut rx));

        tx.send(()).unwrap();
        assert!(quit_requested(&mut rx));
    }
}
