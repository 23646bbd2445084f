use crate::server::AppState;
use axum::extract::{Path, State};
use axum::Json;
use tangent_core::embeddings::SimilarNote;

const SIMILAR_LIMIT: usize = 5;

/// Related notes by embedding similarity. Slugs without an embedding (and
/// deployments without an embeddings file) answer an empty list.
pub async fn get_similar(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Json<Vec<SimilarNote>> {
    match &state.embeddings {
        Some(embeddings) => Json(embeddings.find_similar(&slug, SIMILAR_LIMIT)),
        None => Json(Vec::new()),
    }
}
