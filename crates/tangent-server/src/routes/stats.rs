use super::require_feature;
use crate::error::ApiError;
use crate::server::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use tangent_core::graph::build_graph;
use tangent_core::stats::{build_stats, StatsData};

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsData>, ApiError> {
    require_feature(state.config.features.stats)?;

    let docs = state.store.documents().map_err(|e| {
        tracing::error!(error = %e, "error building stats");
        ApiError::Internal("failed to load content".to_string())
    })?;

    let graph = build_graph(&docs);
    Ok(Json(build_stats(&docs, &graph, Utc::now().date_naive())))
}
