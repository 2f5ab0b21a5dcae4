use axum::{Json, extract::State};
use std::sync::Arc;

use super::{AddDefaultKeywordRequest, ApiError, AppState, DefaultKeywordsResponse};
use crate::services::DefaultKeywordList;

pub async fn get_defaults(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    let list = default_list(&state).await;
    let keywords = list
        .read()
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;
    Ok(Json(keywords))
}

pub async fn add_default(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddDefaultKeywordRequest>,
) -> Result<Json<DefaultKeywordsResponse>, ApiError> {
    if request.keyword.trim().is_empty() {
        return Err(ApiError::validation("keyword cannot be empty"));
    }

    let list = default_list(&state).await;
    let keywords = list
        .prepend(&request.keyword)
        .await
        .map_err(|e| ApiError::InternalError(e.to_string()))?;

    Ok(Json(DefaultKeywordsResponse {
        success: true,
        keywords,
    }))
}

async fn default_list(state: &AppState) -> DefaultKeywordList {
    let path = state.config().read().await.general.defaults_path.clone();
    DefaultKeywordList::new(path)
}
