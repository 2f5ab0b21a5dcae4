use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct DebugResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub store: StoreHealth,
}

#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub connected: bool,
    pub total_keywords: u64,
}

pub async fn debug_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DebugResponse>, ApiError> {
    let connected = state.store().ping().await.is_ok();
    let total_keywords = if connected {
        state.store().keyword_count().await.unwrap_or(0)
    } else {
        0
    };

    Ok(Json(DebugResponse {
        status: if connected { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        store: StoreHealth {
            connected,
            total_keywords,
        },
    }))
}
