//! Request and response types for the Anthropic messages API.
//!
//! Only the text-conversation subset is modeled; the healer never sends
//! tools or images.

use serde::{Deserialize, Serialize};

/// Message request posted to `/v1/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    /// Model identifier (e.g., "claude-sonnet-4-5-20250929")
    pub model: String,

    /// Array of messages in the conversation
    pub messages: Vec<Message>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Temperature for sampling (0.0-1.0, optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A single message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: String,

    /// Text content of the message
    pub content: String,
}

impl Message {
    /// Create a user-role message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Response from the messages API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Unique message ID
    pub id: String,

    /// Array of content blocks in the response
    pub content: Vec<ContentBlock>,

    /// Model that generated the response
    pub model: String,

    /// Reason why generation stopped
    #[serde(default)]
    pub stop_reason: Option<StopReason>,

    /// Token usage statistics
    pub usage: Usage,
}

impl MessageResponse {
    /// Concatenated text of all text content blocks
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.as_str(),
            })
            .collect()
    }
}

/// Content block in a response message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content
    Text { text: String },
}

/// Reason why message generation stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of turn
    EndTurn,
    /// Maximum tokens reached
    MaxTokens,
    /// Stop sequence encountered
    StopSequence,
    /// Any stop reason this client does not model
    #[serde(other)]
    Other,
}

/// Token usage statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Number of input tokens
    pub input_tokens: u32,

    /// Number of output tokens
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_skips_empty_options() {
        let request = MessageRequest {
            model: "claude-sonnet-4-5-20250929".to_string(),
            messages: vec![Message::user("Why did this test fail?")],
            max_tokens: 256,
            system: None,
            temperature: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("claude-sonnet-4-5-20250929"));
        assert!(json.contains("Why did this test fail?"));
        assert!(!json.contains("system"));
        assert!(!json.contains("temperature"));
    }

    #[test]
    fn test_request_serialization_includes_system() {
        let request = MessageRequest {
            model: "m".to_string(),
            messages: vec![Message::user("hi")],
            max_tokens: 16,
            system: Some("You classify test failures.".to_string()),
            temperature: Some(0.2),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""system":"You classify test failures.""#));
        assert!(json.contains("0.2"));
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "type: refactoring"}],
            "model": "claude-sonnet-4-5-20250929",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 120, "output_tokens": 8}
        }"#;

        let response: MessageResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.id, "msg_01");
        assert_eq!(response.text(), "type: refactoring");
        assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
        assert_eq!(response.usage.output_tokens, 8);
    }

    #[test]
    fn test_response_unknown_stop_reason() {
        let body = r#"{
            "id": "msg_02",
            "content": [{"type": "text", "text": "a"}, {"type": "text", "text": "b"}],
            "model": "m",
            "stop_reason": "refusal",
            "usage": {"input_tokens": 1, "output_tokens": 1}
        }"#;

        let response: MessageResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.stop_reason, Some(StopReason::Other));
        assert_eq!(response.text(), "ab");
    }
}
