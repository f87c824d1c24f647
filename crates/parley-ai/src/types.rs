//! Wire shapes for the inference backend

use serde::{Deserialize, Serialize};

/// Block type marking primary text content in a response.
pub const OUTPUT_TEXT: &str = "output_text";

/// Request body sent to the backend. Constructed per call, never persisted.
///
/// Generation parameters and the stream flag are filled in from the resolved
/// profile by the client; the protocol mapper only sets model, input, and the
/// continuation handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundRequest {
    /// Target model id from the resolved profile
    pub model: String,
    /// Assembled input text
    pub input: String,
    /// Handle of the prior exchange. Omitted, not null, when absent: the
    /// backend distinguishes a missing field from an explicit null.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,
}

impl OutboundRequest {
    /// Create a request carrying only the mapper-owned fields
    pub fn new(
        model: impl Into<String>,
        input: impl Into<String>,
        previous_response_id: Option<String>,
    ) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            previous_response_id,
            stream: None,
            temperature: None,
            max_output_tokens: None,
            response_format: None,
        }
    }
}

/// Lifecycle status of a backend response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    InProgress,
    Completed,
    Incomplete,
    Failed,
    #[serde(other)]
    Unknown,
}

/// One typed content block in a response. Kept as a plain tagged struct so
/// unknown block types coming from the backend are carried, not rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

impl ContentBlock {
    /// Create a primary text block
    pub fn output_text(text: impl Into<String>) -> Self {
        Self {
            kind: OUTPUT_TEXT.to_string(),
            text: text.into(),
        }
    }

    /// Whether this block carries primary text content
    pub fn is_output_text(&self) -> bool {
        self.kind == OUTPUT_TEXT
    }
}

/// Token usage counters reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
    #[serde(default)]
    pub reasoning_tokens: u32,
}

/// Complete response from the backend. Ephemeral at this layer: only the
/// derived turn and the continuation handle (the response `id`) survive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundResponse {
    /// Response id; becomes the next continuation handle
    pub id: String,
    pub status: ResponseStatus,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub usage: UsageCounters,
    #[serde(default)]
    pub previous_response_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_absent_continuation_handle() {
        let request = OutboundRequest::new("gpt-test", "hello", None);
        let json = serde_json::to_value(&request).unwrap();
        // Omission, not null, signals "no continuation" to the backend.
        assert!(json.get("previous_response_id").is_none());
        assert!(json.get("stream").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_request_carries_present_continuation_handle() {
        let request = OutboundRequest::new("gpt-test", "hello", Some("r1".to_string()));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["previous_response_id"], "r1");
    }

    #[test]
    fn test_response_decodes_unknown_status_and_block_types() {
        let body = r#"{
            "id": "resp_1",
            "status": "queued",
            "content": [
                {"type": "tool_status", "text": ""},
                {"type": "output_text", "text": "4"}
            ],
            "usage": {"input_tokens": 3, "output_tokens": 1, "total_tokens": 4, "reasoning_tokens": 0},
            "previous_response_id": null
        }"#;
        let response: InboundResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.status, ResponseStatus::Unknown);
        assert_eq!(response.content.len(), 2);
        assert!(!response.content[0].is_output_text());
        assert!(response.content[1].is_output_text());
        assert_eq!(response.usage.total_tokens, 4);
    }

    #[test]
    fn test_response_defaults_for_missing_fields() {
        let body = r#"{"id": "resp_2", "status": "completed"}"#;
        let response: InboundResponse = serde_json::from_str(body).unwrap();
        assert!(response.content.is_empty());
        assert_eq!(response.usage, UsageCounters::default());
        assert!(response.previous_response_id.is_none());
    }
}
