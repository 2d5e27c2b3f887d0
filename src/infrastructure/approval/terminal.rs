//! Terminal approval gate.
//!
//! Shows one proposed change at a time on stdout and reads a one-letter
//! verdict from stdin. Stdin is read on a blocking task so the async
//! healing loop is never parked on a file descriptor.

use std::io::{stdin, stdout, BufRead, Write};

use async_trait::async_trait;

use crate::domain::errors::{HealError, HealResult};
use crate::domain::models::CodeChange;
use crate::domain::ports::{ApprovalDecision, ApprovalPort};

const EXCERPT_LINES: usize = 12;

/// Interactive approval gate backed by the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalApproval;

impl TerminalApproval {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ApprovalPort for TerminalApproval {
    async fn request(&self, change: &CodeChange) -> HealResult<ApprovalDecision> {
        let change = change.clone();
        tokio::task::spawn_blocking(move || {
            display_change(&change)?;
            prompt_decision()
        })
        .await
        .map_err(|e| HealError::Io(std::io::Error::other(format!("approval prompt failed: {e}"))))?
    }
}

/// Print a reviewable summary of the change.
fn display_change(change: &CodeChange) -> HealResult<()> {
    let mut out = stdout();

    writeln!(out)?;
    writeln!(out, "Proposed change to {}", change.file.display())?;
    writeln!(out, "Reason: {}", change.reason)?;
    writeln!(out)?;

    if change.is_whole_file() {
        write_excerpt(&mut out, "replacement file content", &change.new_content)?;
    } else {
        write_excerpt(&mut out, "current", &change.old_content)?;
        write_excerpt(&mut out, "replacement", &change.new_content)?;
    }

    out.flush()?;
    Ok(())
}

fn write_excerpt(out: &mut impl Write, label: &str, content: &str) -> std::io::Result<()> {
    writeln!(out, "--- {label}")?;
    let total = content.lines().count();
    for line in content.lines().take(EXCERPT_LINES) {
        writeln!(out, "  {line}")?;
    }
    if total > EXCERPT_LINES {
        writeln!(out, "  ... ({} more lines)", total - EXCERPT_LINES)?;
    }
    Ok(())
}

/// Prompt until the reviewer gives a recognizable answer.
///
/// EOF on stdin quits the run: with no terminal attached nothing can ever
/// be approved, and quitting beats looping forever.
fn prompt_decision() -> HealResult<ApprovalDecision> {
    let mut out = stdout();
    let stdin = stdin();
    let mut handle = stdin.lock();

    loop {
        write!(out, "Apply this change? [y]es / [n]o / [q]uit: ")?;
        out.flush()?;

        let mut input = String::new();
        let bytes = handle.read_line(&mut input)?;
        if bytes == 0 {
            writeln!(out)?;
            writeln!(out, "No input available; quitting.")?;
            return Ok(ApprovalDecision::Quit);
        }

        match parse_decision(&input) {
            Some(decision) => return Ok(decision),
            None => {
                writeln!(out, "Please answer 'y', 'n', or 'q'.")?;
            }
        }
    }
}

fn parse_decision(input: &str) -> Option<ApprovalDecision> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(ApprovalDecision::Approve),
        "n" | "no" => Some(ApprovalDecision::Reject),
        "q" | "quit" => Some(ApprovalDecision::Quit),
        _ => None,
    }
}
