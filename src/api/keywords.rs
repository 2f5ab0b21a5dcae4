use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{
    ApiError, AppState, CreateKeywordRequest, CreateKeywordResponse, IgnoreKeywordRequest,
    KeywordDto, KeywordListResponse, KeywordSnapshotResponse, PaginationDto, StatsDto,
    SuccessResponse, UseBatchRequest, UseBatchResponse,
};
use crate::db::{KeywordListFilter, TriState, UpsertKeyword, UpsertOutcome};

/// Keywords shown in the raw snapshot preview.
const SNAPSHOT_PREVIEW: u64 = 10;

/// Keyword texts sampled for quick eyeballing of the snapshot.
const SNAPSHOT_SAMPLE: usize = 5;

const MAX_PAGE_LIMIT: u64 = 100;

#[derive(Deserialize)]
pub struct ListQuery {
    /// Only keywords last used strictly before this timestamp (or never).
    pub before: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub async fn list_keywords(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<KeywordListResponse>, ApiError> {
    let defaults = KeywordListFilter::default();
    let filter = KeywordListFilter {
        used_before: query.before.map_or(TriState::Any, TriState::MustMatch),
        kind: query.kind.map_or(TriState::Any, TriState::MustMatch),
        page: query.page.unwrap_or(defaults.page).max(1),
        limit: query
            .limit
            .unwrap_or(defaults.limit)
            .clamp(1, MAX_PAGE_LIMIT),
    };

    let page = state.store().list_keywords(&filter).await?;
    let stats = state.store().keyword_stats().await?;

    Ok(Json(KeywordListResponse {
        pagination: PaginationDto::from(&page),
        keywords: page.records.into_iter().map(KeywordDto::from).collect(),
        stats: StatsDto::from(stats),
    }))
}

/// Unfiltered snapshot: every keyword counts toward the total, including
/// ignored ones, with only the newest few materialized.
pub async fn keyword_snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<Json<KeywordSnapshotResponse>, ApiError> {
    let (total, records) = state.store().keyword_snapshot(SNAPSHOT_PREVIEW).await?;

    let sample = records
        .iter()
        .take(SNAPSHOT_SAMPLE)
        .map(|r| r.keyword.clone())
        .collect();

    Ok(Json(KeywordSnapshotResponse {
        total,
        keywords: records.into_iter().map(KeywordDto::from).collect(),
        sample,
    }))
}

pub async fn create_keyword(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateKeywordRequest>,
) -> Result<(StatusCode, Json<CreateKeywordResponse>), ApiError> {
    let keyword = request.keyword.trim().to_string();
    if keyword.is_empty() {
        return Err(ApiError::validation("keyword cannot be empty"));
    }

    let outcome = state
        .store()
        .upsert_keyword(&UpsertKeyword {
            keyword,
            source: request.source,
            trend_percentage: request.trend_percentage,
        })
        .await?;

    let (status, message) = match outcome {
        UpsertOutcome::Created(_) => (StatusCode::CREATED, None),
        UpsertOutcome::Updated(_) => (StatusCode::OK, Some("Keyword updated".to_string())),
        UpsertOutcome::AlreadyExists(_) => {
            (StatusCode::OK, Some("Keyword already exists".to_string()))
        }
    };

    Ok((
        status,
        Json(CreateKeywordResponse {
            success: true,
            id: Some(outcome.id()),
            message,
        }),
    ))
}

pub async fn use_keyword(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if state.store().mark_keyword_used(id).await? {
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(ApiError::keyword_not_found(id))
    }
}

pub async fn use_keywords_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UseBatchRequest>,
) -> Result<Json<UseBatchResponse>, ApiError> {
    // An empty batch is a valid degenerate no-op, like unmatched keywords.
    let updated = state
        .store()
        .mark_keywords_used_batch(&request.keywords, request.kind.as_deref())
        .await?;

    Ok(Json(UseBatchResponse {
        success: true,
        updated,
    }))
}

pub async fn ignore_keyword(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IgnoreKeywordRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    if state.store().ignore_keyword(request.keyword_id).await? {
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(ApiError::keyword_not_found(request.keyword_id))
    }
}

pub async fn list_types(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.store().list_keyword_types().await?))
}
