//! Anthropic messages API adapter for the completion port.

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::AnthropicClient;
pub use error::CompletionApiError;
pub use retry::RetryPolicy;
