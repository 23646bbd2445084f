use super::require_feature;
use crate::error::ApiError;
use crate::server::AppState;
use axum::extract::{Path, State};
use axum::Json;
use tangent_core::graph::{build_note_graph, NoteGraph};

/// Two-level neighborhood of one note. An unknown slug (and a store
/// failure) both answer `null`; the page renders without its graph panel.
pub async fn get_note_graph(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Option<NoteGraph>>, ApiError> {
    require_feature(state.config.features.graph)?;

    let docs = match state.store.documents() {
        Ok(docs) => docs,
        Err(e) => {
            tracing::error!(error = %e, "error building note graph data");
            return Ok(Json(None));
        }
    };
    Ok(Json(build_note_graph(&docs, &slug)))
}
