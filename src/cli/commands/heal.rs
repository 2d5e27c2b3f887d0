//! Healing run command.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use tracing::warn;
use uuid::Uuid;

use crate::application::{BatchHealer, SessionController};
use crate::cli::output::progress::{create_spinner, ProgressBarExt};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, DecisionMode, HealingSession, SessionOutcome};
use crate::domain::ports::CompletionClient;
use crate::infrastructure::approval::TerminalApproval;
use crate::infrastructure::completion::AnthropicClient;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::runner::SubprocessRunner;
use crate::infrastructure::store::FsSessionStore;

#[derive(Args, Debug)]
pub struct HealArgs {
    /// Test files or directories to heal; omit to heal the whole suite
    pub targets: Vec<String>,

    /// Decision mode: interactive, auto, force, or dry-run
    #[arg(short, long, default_value = "interactive")]
    pub mode: String,

    /// Upper bound on heal-and-rerun cycles
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Heal targets concurrently in fixed-size batches
    #[arg(long)]
    pub batch: bool,

    /// Targets per concurrent batch (with --batch)
    #[arg(long)]
    pub batch_size: Option<usize>,
}

#[derive(Debug, serde::Serialize)]
pub struct HealOutput {
    pub results: Vec<TargetOutcome>,
    pub healed: usize,
    pub total: usize,
}

#[derive(Debug, serde::Serialize)]
pub struct TargetOutcome {
    pub target: Option<String>,
    pub session_id: Option<Uuid>,
    pub outcome: Option<SessionOutcome>,
    pub iterations: u32,
    pub changes_applied: usize,
    pub error: Option<String>,
}

impl TargetOutcome {
    fn from_session(target: Option<String>, session: &HealingSession) -> Self {
        Self {
            target,
            session_id: Some(session.session_id),
            outcome: session.outcome,
            iterations: session.iteration,
            changes_applied: session.changes_applied(),
            error: None,
        }
    }

    fn from_error(target: Option<String>, err: &anyhow::Error) -> Self {
        Self {
            target,
            session_id: None,
            outcome: None,
            iterations: 0,
            changes_applied: 0,
            error: Some(format!("{err:#}")),
        }
    }

    fn is_green(&self) -> bool {
        matches!(
            self.outcome,
            Some(SessionOutcome::Healed | SessionOutcome::NoFailures)
        )
    }

    fn describe(&self) -> String {
        let name = self.target.as_deref().unwrap_or("<suite>");
        if let Some(error) = &self.error {
            return format!("✗ {name}: {error}");
        }
        match self.outcome {
            Some(SessionOutcome::Healed) => format!(
                "✓ {name}: healed after {} iteration(s), {} change(s) applied",
                self.iterations, self.changes_applied
            ),
            Some(SessionOutcome::NoFailures) => format!("✓ {name}: already passing"),
            Some(SessionOutcome::MaxIterationsReached) => format!(
                "✗ {name}: still failing after {} iteration(s)",
                self.iterations
            ),
            Some(SessionOutcome::ManualReviewRequired) => {
                format!("⧗ {name}: manual review required")
            }
            Some(SessionOutcome::DryRunComplete) => {
                format!("○ {name}: dry run complete, no files written")
            }
            Some(SessionOutcome::Cancelled) => format!("⊘ {name}: cancelled"),
            None => format!("? {name}: no outcome recorded"),
        }
    }
}

impl CommandOutput for HealOutput {
    fn to_human(&self) -> String {
        let mut lines: Vec<String> = self.results.iter().map(TargetOutcome::describe).collect();
        if self.total > 1 {
            lines.push(format!("\n{}/{} target(s) green", self.healed, self.total));
        }
        if let [only] = self.results.as_slice() {
            if let Some(id) = only.session_id {
                lines.push(format!(
                    "\nDetails: suture sessions show {}",
                    &id.to_string()[..8]
                ));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: HealArgs, json_mode: bool) -> Result<()> {
    let mode = DecisionMode::from_str(&args.mode).ok_or_else(|| {
        anyhow!(
            "Invalid mode '{}': expected interactive, auto, force, or dry-run",
            args.mode
        )
    })?;
    if args.batch && mode == DecisionMode::Interactive {
        bail!("Interactive approvals cannot drive concurrent batches; use --mode auto, force, or dry-run with --batch");
    }

    let config = ConfigLoader::load().context("Failed to load configuration")?;
    let max_iterations = args.max_iterations.unwrap_or(config.healing.max_iterations);
    let batch_size = if args.batch {
        args.batch_size.unwrap_or(config.healing.batch_size)
    } else {
        1
    };

    let controller = Arc::new(build_controller(&config)?);

    // First ctrl-c asks every running session to stop at its next safe
    // point; an apply already in flight still completes.
    let quit = controller.quit_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = quit.send(());
        }
    });

    let show_spinner = !json_mode && mode != DecisionMode::Interactive;
    let mut results = Vec::new();

    if args.targets.len() <= 1 {
        let target = args.targets.first().cloned();
        let spinner = show_spinner.then(|| {
            create_spinner(match &target {
                Some(t) => format!("Healing {t}"),
                None => "Healing test suite".to_string(),
            })
        });

        let outcome = match controller.run(mode, target.clone(), max_iterations).await {
            Ok(session) => TargetOutcome::from_session(target, &session),
            Err(err) => {
                if let Some(spinner) = &spinner {
                    spinner.finish_error("healing run failed");
                }
                return Err(err);
            }
        };
        if let Some(spinner) = &spinner {
            if outcome.is_green() {
                spinner.finish_success(outcome.describe());
            } else {
                spinner.finish_error(outcome.describe());
            }
        }
        results.push(outcome);
    } else {
        let spinner = show_spinner
            .then(|| create_spinner(format!("Healing {} target(s)", args.targets.len())));
        let healer = BatchHealer::new(Arc::clone(&controller), batch_size);
        for target_result in healer
            .heal_targets(&args.targets, mode, max_iterations)
            .await
        {
            let target = Some(target_result.target);
            results.push(match target_result.result {
                Ok(session) => TargetOutcome::from_session(target, &session),
                Err(err) => TargetOutcome::from_error(target, &err),
            });
        }
        if let Some(spinner) = &spinner {
            let healed = results.iter().filter(|r| r.is_green()).count();
            if healed == results.len() {
                spinner.finish_success(format!("{healed}/{} target(s) green", results.len()));
            } else {
                spinner.finish_error(format!("{healed}/{} target(s) green", results.len()));
            }
        }
    }

    let out = HealOutput {
        healed: results.iter().filter(|r| r.is_green()).count(),
        total: results.len(),
        results,
    };
    output(&out, json_mode);
    Ok(())
}

fn build_controller(config: &Config) -> Result<SessionController> {
    let runner = Arc::new(SubprocessRunner::from_config(&config.runner));
    let approval = Arc::new(TerminalApproval::new());
    let store = Arc::new(FsSessionStore::new(&config.storage.root));
    let completion = build_completion(config)?;

    Ok(SessionController::new(
        runner,
        approval,
        store,
        completion,
        &config.storage.backup_suffix,
    ))
}

fn build_completion(config: &Config) -> Result<Option<Arc<dyn CompletionClient>>> {
    let client = AnthropicClient::from_config(&config.completion, &config.retry)
        .context("Failed to initialize completion client")?;
    match client {
        Some(client) => Ok(Some(Arc::new(client))),
        None => {
            warn!("no API key configured; pattern detection and strategies run heuristic-only");
            Ok(None)
        }
    }
}
