//! Extraction of structured failures from raw test-runner output.
//!
//! Parsing is heuristic by nature: the runner contract is free text on
//! combined stdout/stderr, so this module scans for `Error:` blocks and
//! stack frames rather than assuming any structured protocol. A failed run
//! whose output defeats the heuristics degrades to a single generic failure
//! record, never an error.

use regex::Regex;
use tracing::debug;

use crate::domain::models::TestFailure;

/// Lines of context retained after an error message.
const MAX_EXCERPT_LINES: usize = 12;

/// Parses one test-tool invocation's output into failure records.
///
/// Pure transform: no side effects, no I/O. Swappable in tests by feeding
/// literal fixtures through [`parse`](Self::parse).
pub struct FailureParser {
    error_marker: Regex,
    stack_frame: Regex,
    test_header: Regex,
    duration_suffix: Regex,
}

impl FailureParser {
    pub fn new() -> Self {
        Self {
            // "Error:", "TypeError:", "AssertionError:" and friends.
            error_marker: Regex::new(r"\b[A-Za-z]*Error:").unwrap(),
            // "at fn (src/a.ts:12:3)" or "at src/a.ts:12:3".
            stack_frame: Regex::new(r"^\s*at\s+(?:.*\()?([^()\s]+):(\d+):(\d+)\)?").unwrap(),
            // Jest-style test headers: "● suite › name" or "✕ name (12 ms)".
            test_header: Regex::new(r"^\s*[●✕✗×]\s+(.+)$").unwrap(),
            duration_suffix: Regex::new(r"\s*\(\d+(?:\.\d+)?\s*m?s\)$").unwrap(),
        }
    }

    /// Parse runner output into failures.
    ///
    /// A passing run yields an empty list regardless of output content. A
    /// failing run yields one failure per recognized error block, or exactly
    /// one generic failure when nothing was recognized.
    pub fn parse(&self, output: &str, passed: bool) -> Vec<TestFailure> {
        if passed {
            return Vec::new();
        }

        let lines: Vec<&str> = output.lines().collect();
        let mut failures = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if self.error_marker.is_match(lines[i]) {
                let (failure, consumed) = self.parse_block(&lines, i);
                failures.push(failure);
                i += consumed;
            } else {
                i += 1;
            }
        }

        if failures.is_empty() {
            debug!("no error blocks recognized, emitting generic failure");
            failures.push(TestFailure::generic(output));
        }

        failures
    }

    /// Parse one error block starting at `start`. Returns the failure and the
    /// number of lines consumed (at least 1).
    fn parse_block(&self, lines: &[&str], start: usize) -> (TestFailure, usize) {
        let first = lines[start];
        let message = self
            .error_marker
            .find(first)
            .map_or_else(|| first.trim().to_string(), |m| first[m.start()..].trim().to_string());

        // The block runs to the next blank line, capped at the excerpt limit.
        let mut excerpt_lines = Vec::new();
        let mut consumed = 1;
        for line in lines.iter().skip(start + 1).take(MAX_EXCERPT_LINES) {
            if line.trim().is_empty() {
                break;
            }
            excerpt_lines.push(line.trim_end());
            consumed += 1;
        }

        let (source_file, line) = self.first_project_frame(&excerpt_lines);

        let failure = TestFailure {
            test_name: self.test_name_before(lines, start),
            error_message: message,
            stack_excerpt: excerpt_lines.join("\n"),
            source_file,
            line,
        };
        (failure, consumed)
    }

    /// First stack frame pointing into project code, skipping node internals
    /// and vendored dependencies.
    fn first_project_frame(&self, excerpt: &[&str]) -> (Option<String>, Option<u32>) {
        for line in excerpt {
            if let Some(caps) = self.stack_frame.captures(line) {
                let file = &caps[1];
                if file.contains("node_modules")
                    || file.starts_with("node:")
                    || file.starts_with("internal/")
                {
                    continue;
                }
                return (Some(file.to_string()), caps[2].parse().ok());
            }
        }
        (None, None)
    }

    /// Nearest test header above the error line, or a placeholder.
    fn test_name_before(&self, lines: &[&str], error_index: usize) -> String {
        for line in lines[..error_index].iter().rev() {
            if let Some(caps) = self.test_header.captures(line) {
                let name = self.duration_suffix.replace(caps[1].trim(), "");
                return name.trim().to_string();
            }
        }
        "unknown-test".to_string()
    }
}

impl Default for FailureParser {
    fn default() -> Self {
        Self::new()
    }
}
