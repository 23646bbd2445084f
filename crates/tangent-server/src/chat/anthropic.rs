//! Minimal client for the Anthropic Messages API: just the request/response
//! shapes the tool loop needs, plus status-code to user-message mapping.

use crate::config::ChatConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
    /// Block types this client does not model (e.g. thinking). Never echoed
    /// back to the API.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    tools: &'a Value,
    messages: &'a [Message],
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Debug, Error)]
pub enum ChatApiError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        retry_after: Option<u64>,
    },
}

impl ChatApiError {
    /// User-facing message; never leaks the raw upstream error text for
    /// known status codes.
    pub fn user_message(&self) -> String {
        match self {
            ChatApiError::Network(_) => "Failed to get response from AI".to_string(),
            ChatApiError::Api {
                status, message, ..
            } => status_message(*status)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    if message.is_empty() {
                        format!("API error ({status})")
                    } else {
                        message.clone()
                    }
                }),
        }
    }
}

fn status_message(status: u16) -> Option<&'static str> {
    match status {
        400 => Some("Invalid request. Please check your message and try again."),
        401 => Some("Invalid API key. Please check your ANTHROPIC_API_KEY configuration."),
        403 => Some("API key does not have permission to use this resource."),
        404 => Some("The requested resource was not found."),
        413 => Some("Your message is too large. Please try with less content."),
        429 => Some("Rate limit exceeded. Please try again in a moment."),
        500 => Some("The AI service encountered an error. Please try again later."),
        503 => Some("The AI service is temporarily unavailable. Please try again later."),
        529 => Some("The AI service is overloaded. Please try again in a moment."),
        _ => None,
    }
}

/// One round-trip to the Messages API.
pub async fn send_messages(
    client: &reqwest::Client,
    api_key: &str,
    chat: &ChatConfig,
    system: &str,
    tools: &Value,
    messages: &[Message],
) -> Result<MessagesResponse, ChatApiError> {
    let request = MessagesRequest {
        model: &chat.model,
        max_tokens: chat.max_tokens,
        system,
        tools,
        messages,
    };

    let response = client
        .post(API_URL)
        .header("x-api-key", api_key)
        .header("anthropic-version", API_VERSION)
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let message = response
            .json::<ApiErrorEnvelope>()
            .await
            .ok()
            .and_then(|envelope| envelope.error)
            .map(|body| body.message)
            .unwrap_or_default();
        return Err(ChatApiError::Api {
            status: status.as_u16(),
            message,
            retry_after,
        });
    }

    Ok(response.json::<MessagesResponse>().await?)
}
