use crate::server::AppState;
use axum::extract::State;
use axum::Json;
use tangent_core::backlinks::{build_backlinks_index, BacklinksIndex};

/// Serve the full backlinks index. A store failure is logged and answered
/// with an empty mapping: a broken backlinks panel must never take down
/// note rendering.
pub async fn get_backlinks(State(state): State<AppState>) -> Json<BacklinksIndex> {
    let docs = match state.store.documents() {
        Ok(docs) => docs,
        Err(e) => {
            tracing::error!(error = %e, "error building backlinks index");
            return Json(BacklinksIndex::new());
        }
    };
    Json(build_backlinks_index(&docs))
}
