//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the async trait interfaces that infrastructure
//! adapters implement:
//! - `TestRunner`: blocking test-suite execution
//! - `CompletionClient`: natural-language completion service
//! - `ApprovalPort`: human approve/reject/quit prompts
//! - `SessionStore`: durable session and learning persistence
//! - `IssueTracker`: optional task-suggestion sink
//!
//! These traits are the contracts that keep the healing engine independent
//! of any specific infrastructure.

pub mod approval;
pub mod completion;
pub mod issue_tracker;
pub mod session_store;
pub mod test_runner;

pub use approval::{ApprovalDecision, ApprovalPort};
pub use completion::{CompletionClient, CompletionRequest};
pub use issue_tracker::{CreatedIssue, IssueTracker, NewIssue};
pub use session_store::{SessionStore, TaskRecord};
pub use test_runner::{TestRunOutput, TestRunner};
