use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient};
use tracing::{debug, info, instrument, warn};

use super::error::CompletionApiError;
use super::retry::RetryPolicy;
use super::types::{Message, MessageRequest, MessageResponse};

use crate::domain::models::config::{CompletionConfig, RetryConfig};
use crate::domain::ports::completion::{self, CompletionClient, CompletionRequest};

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

const ANTHROPIC_VERSION: &str = "2023-06-01";
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// HTTP client for the Anthropic messages API
///
/// Features:
/// - Connection pooling and reuse (via reqwest::Client)
/// - Exponential backoff retry for transient errors
/// - Error classification (transient vs permanent)
/// - 300s timeout for long-running requests
#[derive(Debug)]
pub struct AnthropicClient {
    /// Reusable HTTP client with connection pooling
    http_client: ReqwestClient,

    /// Base URL for the API
    base_url: String,

    /// Model identifier sent with every request
    model: String,

    /// Hard ceiling on generated tokens, from configuration
    max_output_cap: u32,

    /// Retry policy for handling transient errors
    retry_policy: RetryPolicy,
}

impl AnthropicClient {
    /// Create a new client
    ///
    /// # Errors
    /// Returns an error if the API key is not a valid header value or the
    /// HTTP client cannot be built.
    pub fn new(
        api_key: &str,
        model: impl Into<String>,
        base_url: impl Into<String>,
        max_output_cap: u32,
        retry_policy: RetryPolicy,
    ) -> Result<Self, CompletionApiError> {
        let mut key_value = header::HeaderValue::from_str(api_key)
            .map_err(|e| CompletionApiError::InvalidRequest(format!("Invalid API key: {e}")))?;
        key_value.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert("x-api-key", key_value);
        headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http_client = ReqwestClient::builder()
            .pool_max_idle_per_host(10)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .tcp_nodelay(true)
            .default_headers(headers)
            .build()?;

        let base_url = base_url.into();
        let model = model.into();

        info!(%base_url, %model, "completion client initialized");

        Ok(Self {
            http_client,
            base_url,
            model,
            max_output_cap,
            retry_policy,
        })
    }

    /// Build a client from configuration
    ///
    /// Returns `Ok(None)` when no API key is configured, either in the
    /// config file or via `ANTHROPIC_API_KEY`; callers degrade to
    /// heuristic-only behavior in that case.
    pub fn from_config(
        completion: &CompletionConfig,
        retry: &RetryConfig,
    ) -> Result<Option<Self>, CompletionApiError> {
        let api_key = completion
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok());

        let Some(api_key) = api_key else {
            return Ok(None);
        };
        if api_key.trim().is_empty() {
            return Ok(None);
        }

        let base_url = completion
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let max_output_cap = u32::try_from(completion.max_output_tokens).unwrap_or(u32::MAX);

        Self::new(
            &api_key,
            completion.model.clone(),
            base_url,
            max_output_cap,
            RetryPolicy::from_config(retry),
        )
        .map(Some)
    }

    /// Execute a single request (called by the retry policy)
    #[instrument(skip(self, request), fields(model = %request.model, max_tokens = request.max_tokens))]
    async fn execute_request(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, CompletionApiError> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(%url, "sending completion request");

        let response = self.http_client.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());
            warn!(%status, "completion API returned an error");
            return Err(CompletionApiError::from_status(status, body));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> completion::Result<String> {
        let max_tokens = u32::try_from(request.max_output_tokens)
            .unwrap_or(u32::MAX)
            .min(self.max_output_cap);

        let message_request = MessageRequest {
            model: self.model.clone(),
            messages: vec![Message::user(request.user_prompt)],
            max_tokens,
            system: Some(request.system_prompt),
            temperature: None,
        };

        let response = self
            .retry_policy
            .execute(|| self.execute_request(&message_request))
            .await?;

        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "completion succeeded"
        );

        Ok(response.text())
    }
}
