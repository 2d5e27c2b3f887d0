//! Human approval port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::HealResult;
use crate::domain::models::CodeChange;

/// A reviewer's verdict on one proposed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    /// Apply this change.
    Approve,
    /// Skip this change and continue with the rest of the strategy.
    Reject,
    /// Stop the whole run immediately.
    Quit,
}

/// Requests human approval for individual changes.
///
/// Abstracted from the terminal so the controller's decision logic is
/// testable without a real prompt attached. Implementations may block on an
/// input channel; a `Quit` decision must terminate the whole run, not just
/// the current prompt.
#[async_trait]
pub trait ApprovalPort: Send + Sync {
    /// Ask for a verdict on one change.
    async fn request(&self, change: &CodeChange) -> HealResult<ApprovalDecision>;
}
