mod backlinks;
mod graph;
mod mentions;
mod note_graph;
mod raw_content;
mod similar;
mod stats;

use crate::error::ApiError;
use crate::server::AppState;
use axum::routing::{get, post};
use axum::Router;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/backlinks", get(backlinks::get_backlinks))
        .route("/api/graph", get(graph::get_graph))
        .route("/api/note-graph/:slug", get(note_graph::get_note_graph))
        .route("/api/mentions", get(mentions::get_mentions))
        .route("/api/stats", get(stats::get_stats))
        .route("/api/raw-content/:slug", get(raw_content::get_raw_content))
        .route("/api/similar/:slug", get(similar::get_similar))
        .route("/api/chat", post(crate::chat::handle_chat))
}

/// Disabled features are indistinguishable from routes that don't exist.
pub(crate) fn require_feature(enabled: bool) -> Result<(), ApiError> {
    if enabled {
        Ok(())
    } else {
        Err(ApiError::NotFound("Not Found".to_string()))
    }
}
