use crate::error::ApiError;
use crate::server::AppState;
use crate::store::RawContentError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RawContent {
    pub raw: String,
}

pub async fn get_raw_content(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<RawContent>, ApiError> {
    match state.store.raw(&slug) {
        Ok(raw) => Ok(Json(RawContent { raw })),
        Err(RawContentError::InvalidSlug) => {
            Err(ApiError::BadRequest("Invalid slug".to_string()))
        }
        Err(RawContentError::NotFound) => {
            Err(ApiError::NotFound("Content not found".to_string()))
        }
    }
}
