mod anthropic;
mod tools;

use crate::error::ApiError;
use crate::routes::require_feature;
use crate::server::AppState;
use anthropic::{ContentBlock, Message, MessageContent};
use axum::extract::State;
use axum::Json;
use nanoid::nanoid;
use serde::{Deserialize, Serialize};

/// Upper bound on model/tool round-trips for one request.
const MAX_TOOL_ROUNDS: usize = 8;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SourceRef {
    pub title: String,
    pub path: String,
}

/// Chat assistant over the note corpus: an agent loop against the
/// Anthropic Messages API with corpus-search tools. Responds with the
/// final assistant text plus the distinct notes the tools touched.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    require_feature(state.config.features.chat)?;

    let request_id = nanoid!(8);

    let Some(api_key) = state.config.chat.api_key.clone() else {
        tracing::error!(request_id = %request_id, "chat API key not configured");
        return Err(ApiError::Internal(
            "ANTHROPIC_API_KEY is not configured. Please add it to your environment variables."
                .to_string(),
        ));
    };

    if request.message.trim().is_empty() {
        tracing::warn!(request_id = %request_id, "empty chat message");
        return Err(ApiError::BadRequest("Message must not be empty.".to_string()));
    }

    tracing::info!(
        request_id = %request_id,
        message_len = request.message.len(),
        history_len = request.history.len(),
        "incoming chat request"
    );

    let mut messages = build_initial_messages(&request.history, &request.message);
    let mut sources: Vec<SourceRef> = Vec::new();
    let mut reply = String::new();

    for round in 0..MAX_TOOL_ROUNDS {
        let response = anthropic::send_messages(
            &state.http,
            &api_key,
            &state.config.chat,
            tools::SYSTEM_PROMPT,
            tools::tool_definitions(),
            &messages,
        )
        .await
        .map_err(|e| {
            tracing::error!(request_id = %request_id, round, error = %e, "chat upstream error");
            ApiError::Internal(e.user_message())
        })?;

        reply = response
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if response.stop_reason.as_deref() != Some("tool_use") {
            break;
        }

        // Echo the assistant turn back (known blocks only), then answer
        // each tool call in a single user turn.
        let assistant_blocks: Vec<ContentBlock> = response
            .content
            .into_iter()
            .filter(|block| !matches!(block, ContentBlock::Unknown))
            .collect();
        let tool_uses: Vec<(String, String, serde_json::Value)> = assistant_blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => {
                    Some((id.clone(), name.clone(), input.clone()))
                }
                _ => None,
            })
            .collect();

        messages.push(Message {
            role: "assistant".to_string(),
            content: MessageContent::Blocks(assistant_blocks),
        });

        let mut tool_results = Vec::new();
        for (id, name, input) in tool_uses {
            let outcome = tools::execute_tool(&state, &name, &input, &request_id).await;
            for note in outcome.notes {
                if !sources.iter().any(|s| s.path == note.path) {
                    sources.push(note);
                }
            }
            tool_results.push(ContentBlock::ToolResult {
                tool_use_id: id,
                content: outcome.result,
            });
        }
        messages.push(Message {
            role: "user".to_string(),
            content: MessageContent::Blocks(tool_results),
        });
    }

    tracing::info!(request_id = %request_id, sources = sources.len(), "chat completed");
    Ok(Json(ChatResponse { reply, sources }))
}

fn build_initial_messages(history: &[HistoryMessage], message: &str) -> Vec<Message> {
    let mut messages: Vec<Message> = history
        .iter()
        .filter(|h| h.role == "user" || h.role == "assistant")
        .map(|h| Message {
            role: h.role.clone(),
            content: MessageContent::Text(h.content.clone()),
        })
        .collect();
    messages.push(Message {
        role: "user".to_string(),
        content: MessageContent::Text(message.to_string()),
    });
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_messages_end_with_the_new_user_turn() {
        let history = vec![
            HistoryMessage {
                role: "user".to_string(),
                content: "earlier question".to_string(),
            },
            HistoryMessage {
                role: "assistant".to_string(),
                content: "earlier answer".to_string(),
            },
            HistoryMessage {
                role: "system".to_string(),
                content: "should be dropped".to_string(),
            },
        ];
        let messages = build_initial_messages(&history, "new question");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "user");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[2].role, "user");
        assert!(matches!(
            &messages[2].content,
            MessageContent::Text(text) if text == "new question"
        ));
    }
}
