//! Bounded-parallel healing of many independent targets.
//!
//! Targets are processed in fixed-size batches: every target in a batch
//! runs its full sequential pipeline concurrently with its batch-mates,
//! and batches execute one after another. Each target gets its own
//! session; a failing target never aborts its siblings. Targets are
//! deduplicated up front so no two workers ever share a file set.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use futures::future;
use tracing::info;

use crate::application::controller::{quit_requested, SessionController};
use crate::domain::models::{DecisionMode, HealingSession};

/// One target's outcome within a batch run.
pub struct TargetResult {
    pub target: String,
    /// The session, or the fatal error that stopped this target.
    pub result: Result<HealingSession>,
}

/// Heals many targets through one shared controller.
pub struct BatchHealer {
    controller: Arc<SessionController>,
    batch_size: usize,
}

impl BatchHealer {
    pub fn new(controller: Arc<SessionController>, batch_size: usize) -> Self {
        Self {
            controller,
            batch_size: batch_size.max(1),
        }
    }

    /// Heal every target, batch by batch, in input order.
    ///
    /// A quit signal stops new batches from starting; targets already in
    /// flight run to their own safe stopping points. Results cover only the
    /// targets that were started.
    pub async fn heal_targets(
        &self,
        targets: &[String],
        mode: DecisionMode,
        max_iterations: u32,
    ) -> Vec<TargetResult> {
        let targets = dedup_targets(targets);
        let mut quit_rx = self.controller.quit_handle().subscribe();
        let mut results = Vec::with_capacity(targets.len());

        for (batch_index, chunk) in targets.chunks(self.batch_size).enumerate() {
            if quit_requested(&mut quit_rx) {
                info!("quit received, not starting further batches");
                break;
            }
            info!(batch = batch_index, size = chunk.len(), "starting batch");

            let mut handles = Vec::with_capacity(chunk.len());
            for target in chunk {
                let controller = Arc::clone(&self.controller);
                let task_target = target.clone();
                handles.push(tokio::spawn(async move {
                    controller.run(mode, Some(task_target), max_iterations).await
                }));
            }

            let joined = future::join_all(handles).await;
            for (target, outcome) in chunk.iter().zip(joined) {
                let result = match outcome {
                    Ok(result) => result,
                    Err(err) => Err(anyhow!("healing task for {target} panicked: {err}")),
                };
                results.push(TargetResult {
                    target: target.clone(),
                    result,
                });
            }
        }

        results
    }
}

/// Deduplicate targets preserving first-seen order, so no two batch workers
/// can ever write to the same files.
fn dedup_targets(targets: &[String]) -> Vec<String> {
    let mut unique = Vec::with_capacity(targets.len());
    for target in targets {
        if !unique.contains(target) {
            unique.push(target.clone());
        }
    }
    unique
}
