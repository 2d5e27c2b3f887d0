//! Natural-language completion service port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result type for completion client operations
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// A single free-text completion request.
///
/// The engine sends structured prompts but must tolerate completely
/// unstructured prose in return; consumers apply best-effort extraction on
/// the response text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Instructions that frame the task for the service.
    pub system_prompt: String,

    /// The failure context and question being asked.
    pub user_prompt: String,

    /// Cap on generated output tokens.
    pub max_output_tokens: usize,
}

impl CompletionRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        max_output_tokens: usize,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            max_output_tokens,
        }
    }
}

/// Sends completion requests and returns the response as free text.
///
/// Consumers hold `Option<Arc<dyn CompletionClient>>`: `None` means no
/// credential is configured and the engine degrades to heuristic-only
/// behavior instead of erroring.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Execute a single completion request.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}
