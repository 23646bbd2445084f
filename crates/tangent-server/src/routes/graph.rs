use super::require_feature;
use crate::error::ApiError;
use crate::server::AppState;
use axum::extract::State;
use axum::Json;
use tangent_core::graph::{build_graph, GraphData};

pub async fn get_graph(State(state): State<AppState>) -> Result<Json<GraphData>, ApiError> {
    require_feature(state.config.features.graph)?;

    let docs = match state.store.documents() {
        Ok(docs) => docs,
        Err(e) => {
            tracing::error!(error = %e, "error building graph data");
            return Ok(Json(GraphData::default()));
        }
    };
    Ok(Json(build_graph(&docs)))
}
