use super::require_feature;
use crate::error::ApiError;
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tangent_core::mentions::{find_unlinked_mentions, MentionItem};

#[derive(Debug, Deserialize)]
pub struct MentionsQuery {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
}

pub async fn get_mentions(
    State(state): State<AppState>,
    Query(query): Query<MentionsQuery>,
) -> Result<Json<Vec<MentionItem>>, ApiError> {
    require_feature(state.config.features.mentions)?;

    let docs = match state.store.documents() {
        Ok(docs) => docs,
        Err(e) => {
            tracing::error!(error = %e, "error finding unlinked mentions");
            return Ok(Json(Vec::new()));
        }
    };
    Ok(Json(find_unlinked_mentions(&docs, &query.slug, &query.title)))
}
