//! Classification of failure batches into healing patterns.
//!
//! Two detection paths sit behind one entry point: a completion-service
//! backed path that asks for a classification and parses the free-text
//! reply, and a keyword heuristic used when no service is configured or the
//! service errors. Detection never fails a session; the worst case is the
//! unknown pattern at baseline confidence.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::models::{HealingPattern, PatternKind, TestFailure};
use crate::domain::ports::{CompletionClient, CompletionRequest};

const SYSTEM_PROMPT: &str = "You are a test-failure triage assistant. Given a list of \
failing tests, classify the batch into exactly one category: library-upgrade, api-change, \
refactoring, data-update, component-specific, or unknown. Reply with three lines:\n\
type: <category>\nconfidence: <0.0-1.0>\nfix: <one-line suggested remediation>";

const MAX_OUTPUT_TOKENS: usize = 1024;

/// Heuristic confidence per keyword category. Fixed constants, not
/// calibrated probabilities; useful for ordering only.
const HEURISTICS: &[(&[&str], PatternKind, f64)] = &[
    (
        &["cannot find module", "module not found", "is not exported"],
        PatternKind::LibraryUpgrade,
        0.85,
    ),
    (
        &["404", "endpoint", "api", "unexpected response"],
        PatternKind::ApiChange,
        0.8,
    ),
    (
        &["snapshot", "fixture", "mock data", "seed"],
        PatternKind::DataUpdate,
        0.75,
    ),
    (
        &["undefined is not", "cannot read propert", "is not a function"],
        PatternKind::Refactoring,
        0.7,
    ),
    (
        &["render", "component", "selector", "element not found"],
        PatternKind::ComponentSpecific,
        0.65,
    ),
];

/// Detects the dominant pattern behind a batch of failures.
pub struct PatternDetector {
    client: Option<Arc<dyn CompletionClient>>,
}

impl PatternDetector {
    /// `client: None` pins the detector to the heuristic path.
    pub fn new(client: Option<Arc<dyn CompletionClient>>) -> Self {
        Self { client }
    }

    /// Classify a failure batch. Falls back to the keyword heuristic when
    /// the completion service is missing or errors.
    pub async fn detect(&self, failures: &[TestFailure]) -> HealingPattern {
        if failures.is_empty() {
            return HealingPattern::unknown(failures);
        }

        if let Some(client) = &self.client {
            let request = CompletionRequest::new(
                SYSTEM_PROMPT,
                Self::describe_failures(failures),
                MAX_OUTPUT_TOKENS,
            );
            match client.complete(request).await {
                Ok(reply) => return Self::parse_reply(&reply, failures),
                Err(err) => {
                    warn!(error = %err, "completion-backed detection failed, using heuristics");
                }
            }
        }

        self.heuristic(failures)
    }

    /// Keyword classification over the concatenated error messages.
    ///
    /// The first matching category wins; categories are ordered from most to
    /// least specific.
    pub fn heuristic(&self, failures: &[TestFailure]) -> HealingPattern {
        let haystack = failures
            .iter()
            .map(|f| f.error_message.to_lowercase())
            .collect::<Vec<_>>()
            .join("\n");

        for (keywords, kind, confidence) in HEURISTICS {
            if keywords.iter().any(|k| haystack.contains(k)) {
                debug!(kind = %kind, confidence, "heuristic pattern match");
                return HealingPattern::new(*kind, *confidence, failures);
            }
        }

        HealingPattern::unknown(failures)
    }

    /// Extract a pattern from a free-text classification reply.
    ///
    /// Recognizes `type:`, `confidence:`, and `fix:` line prefixes anywhere
    /// in the reply; anything missing falls back to conservative defaults.
    fn parse_reply(reply: &str, failures: &[TestFailure]) -> HealingPattern {
        let mut kind = PatternKind::Unknown;
        let mut confidence = 0.5;
        let mut fix = String::new();

        for line in reply.lines() {
            let line = line.trim();
            if let Some(rest) = strip_prefix_ci(line, "type:") {
                kind = PatternKind::parse(rest);
            } else if let Some(rest) = strip_prefix_ci(line, "confidence:") {
                if let Ok(value) = rest.trim().parse::<f64>() {
                    confidence = value;
                }
            } else if let Some(rest) = strip_prefix_ci(line, "fix:") {
                fix = rest.trim().to_string();
            }
        }

        HealingPattern::new(kind, confidence, failures).with_fix(fix)
    }

    /// Render the failure batch as a numbered prompt section.
    fn describe_failures(failures: &[TestFailure]) -> String {
        let mut prompt = String::from("Failing tests:\n");
        for (index, failure) in failures.iter().enumerate() {
            let _ = write!(prompt, "{}. {}: {}", index + 1, failure.test_name, failure.error_message);
            if let Some(file) = &failure.source_file {
                let _ = write!(prompt, " [{file}]");
            }
            prompt.push('\n');
        }
        prompt
    }
}

/// Case-insensitive prefix strip. `get` keeps an unlucky multi-byte char at
/// the boundary from panicking the slice.
pub(crate) fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}
