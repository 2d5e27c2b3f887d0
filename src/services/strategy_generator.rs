//! Fix strategy generation and selection.
//!
//! Generation always yields the full risk spectrum: at least three named
//! strategies ordered conservative to aggressive. Offline they are stubs
//! with empty change sets; with a completion service they carry changes
//! extracted from fenced code blocks in the reply. Picking one strategy for
//! the iteration is a separate explicit step, never implicit in generation.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::models::{CodeChange, FixStrategy, HealingPattern, RiskLevel, TestFailure};
use crate::domain::ports::{CompletionClient, CompletionRequest};
use crate::services::pattern_detector::strip_prefix_ci;

const SYSTEM_PROMPT: &str = "You are a test-healing assistant. Propose at least three fix \
strategies ordered by risk: conservative, hybrid, aggressive. For each strategy emit:\n\
strategy: <name>\nrisk: <low|medium|high>\neffort: <estimate>\n<short description>\n\
followed by fenced code blocks. Every block must begin with a line 'file: <path>' and may \
carry a 'reason: <text>' line; then the exact content to replace, a line containing only \
---, and the replacement. Omit the --- separator to replace the file wholesale.";

const MAX_OUTPUT_TOKENS: usize = 4096;

/// Produces candidate fix strategies for a failure batch.
pub struct StrategyGenerator {
    client: Option<Arc<dyn CompletionClient>>,
}

impl StrategyGenerator {
    /// `client: None` yields stub strategies only.
    pub fn new(client: Option<Arc<dyn CompletionClient>>) -> Self {
        Self { client }
    }

    /// Generate at least three strategies, sorted by ascending risk.
    pub async fn generate(
        &self,
        failures: &[TestFailure],
        pattern: &HealingPattern,
    ) -> Vec<FixStrategy> {
        let mut strategies = match &self.client {
            Some(client) => {
                let request = CompletionRequest::new(
                    SYSTEM_PROMPT,
                    Self::describe(failures, pattern),
                    MAX_OUTPUT_TOKENS,
                );
                match client.complete(request).await {
                    Ok(reply) => Self::parse_reply(&reply),
                    Err(err) => {
                        warn!(error = %err, "strategy generation failed, emitting stubs");
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        Self::fill_missing_tiers(&mut strategies);
        strategies.sort_by_key(|s| s.risk);
        debug!(count = strategies.len(), "strategies generated");
        strategies
    }

    /// Ensure every risk tier is represented, padding with stubs.
    fn fill_missing_tiers(strategies: &mut Vec<FixStrategy>) {
        for risk in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            if !strategies.iter().any(|s| s.risk == risk) {
                strategies.push(Self::stub_for(risk));
            }
        }
    }

    fn stub_for(risk: RiskLevel) -> FixStrategy {
        match risk {
            RiskLevel::Low => FixStrategy::stub(
                "conservative",
                "Minimal change addressing only the failing assertions.",
                RiskLevel::Low,
                "low",
            ),
            RiskLevel::Medium => FixStrategy::stub(
                "hybrid",
                "Balanced fix touching the failure sites and their immediate callers.",
                RiskLevel::Medium,
                "medium",
            ),
            RiskLevel::High => FixStrategy::stub(
                "aggressive",
                "Restructure the affected area to remove the failure class.",
                RiskLevel::High,
                "high",
            ),
        }
    }

    /// Extract strategies from a free-text reply.
    ///
    /// Strategy headers open a new strategy; fenced blocks attach to the
    /// open strategy, or to a synthesized `suggested-fix` strategy when the
    /// reply never declared one.
    fn parse_reply(reply: &str) -> Vec<FixStrategy> {
        let lines: Vec<&str> = reply.lines().collect();
        let mut strategies: Vec<FixStrategy> = Vec::new();
        let mut current: Option<FixStrategy> = None;
        let mut orphans: Vec<CodeChange> = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let trimmed = lines[i].trim();

            if trimmed.starts_with("```") {
                let (body, consumed) = collect_fence(&lines, i);
                if let Some(change) = parse_change(&body) {
                    match current.as_mut() {
                        Some(strategy) => strategy.changes.push(change),
                        None => orphans.push(change),
                    }
                }
                i += consumed;
                continue;
            }

            if let Some(rest) = strip_prefix_ci(trimmed, "strategy:") {
                if let Some(done) = current.take() {
                    strategies.push(done);
                }
                current = Some(FixStrategy {
                    name: rest.trim().to_string(),
                    description: String::new(),
                    risk: RiskLevel::Medium,
                    estimated_effort: "unknown".to_string(),
                    changes: Vec::new(),
                });
            } else if let Some(rest) = strip_prefix_ci(trimmed, "risk:") {
                if let Some(strategy) = current.as_mut() {
                    strategy.risk = RiskLevel::parse(rest);
                }
            } else if let Some(rest) = strip_prefix_ci(trimmed, "effort:") {
                if let Some(strategy) = current.as_mut() {
                    strategy.estimated_effort = rest.trim().to_string();
                }
            } else if !trimmed.is_empty() {
                if let Some(strategy) = current.as_mut() {
                    if !strategy.description.is_empty() {
                        strategy.description.push(' ');
                    }
                    strategy.description.push_str(trimmed);
                }
            }

            i += 1;
        }

        if let Some(done) = current.take() {
            strategies.push(done);
        }
        if !orphans.is_empty() {
            strategies.push(FixStrategy {
                name: "suggested-fix".to_string(),
                description: "Changes extracted from an unstructured reply.".to_string(),
                risk: RiskLevel::Medium,
                estimated_effort: "unknown".to_string(),
                changes: orphans,
            });
        }
        strategies
    }

    fn describe(failures: &[TestFailure], pattern: &HealingPattern) -> String {
        let mut prompt = format!(
            "Detected pattern: {} (confidence {:.2})\n",
            pattern.kind, pattern.confidence
        );
        if !pattern.suggested_fix.is_empty() {
            let _ = writeln!(prompt, "Suggested direction: {}", pattern.suggested_fix);
        }
        prompt.push_str("Failing tests:\n");
        for failure in failures {
            let _ = writeln!(prompt, "- {}: {}", failure.test_name, failure.error_message);
            if !failure.stack_excerpt.is_empty() {
                let _ = writeln!(prompt, "{}", failure.stack_excerpt);
            }
        }
        prompt
    }
}

/// Pick the strategy to apply this iteration: the lowest-risk candidate that
/// actually carries changes. `None` when every candidate is a stub.
pub fn select_strategy(strategies: &[FixStrategy]) -> Option<&FixStrategy> {
    strategies.iter().find(|s| s.is_actionable())
}

/// Collect a fenced block's body lines. Returns the body and the total lines
/// consumed including both fence markers.
fn collect_fence<'a>(lines: &[&'a str], start: usize) -> (Vec<&'a str>, usize) {
    let mut body = Vec::new();
    let mut i = start + 1;
    while i < lines.len() && !lines[i].trim().starts_with("```") {
        body.push(lines[i]);
        i += 1;
    }
    // +1 for the closing fence when present.
    let consumed = if i < lines.len() { i - start + 1 } else { i - start };
    (body, consumed)
}

/// Parse one fenced block into a change. Blocks without a parseable
/// `file:` header are discarded, never defaulted.
fn parse_change(body: &[&str]) -> Option<CodeChange> {
    let mut iter = body.iter().copied().skip_while(|l| l.trim().is_empty());

    let file = strip_prefix_ci(iter.next()?.trim(), "file:")?.trim().to_string();
    if file.is_empty() {
        return None;
    }

    let mut rest: Vec<&str> = iter.collect();
    let mut reason = String::from("suggested fix");
    if let Some(first) = rest.first() {
        if let Some(r) = strip_prefix_ci(first.trim(), "reason:") {
            reason = r.trim().to_string();
            rest.remove(0);
        }
    }

    // A header with no body would blank the file on apply; drop it.
    if rest.is_empty() {
        return None;
    }

    match rest.iter().position(|l| l.trim() == "---") {
        Some(split) => Some(CodeChange::new(
            file,
            rest[..split].join("\n"),
            rest[split + 1..].join("\n"),
            reason,
        )),
        None => Some(CodeChange::new(file, "", rest.join("\n"), reason)),
    }
}
