use serde::{Deserialize, Serialize};

use crate::db::{KeywordPage, KeywordRecord, KeywordStats};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct KeywordDto {
    pub id: i32,
    pub keyword: String,
    pub first_created_time: String,
    pub last_used_time: Option<String>,
    pub source: Option<String>,
    pub trend_percentage: Option<f64>,
    pub last_updated: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub ignore: bool,
    pub ignore_time: Option<String>,
}

impl From<KeywordRecord> for KeywordDto {
    fn from(record: KeywordRecord) -> Self {
        Self {
            id: record.id,
            keyword: record.keyword,
            first_created_time: record.first_created_time,
            last_used_time: record.last_used_time,
            source: record.source,
            trend_percentage: record.trend_percentage,
            last_updated: record.last_updated,
            kind: record.kind,
            ignore: record.ignore,
            ignore_time: record.ignore_time,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDto {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl From<&KeywordPage> for PaginationDto {
    fn from(page: &KeywordPage) -> Self {
        Self {
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages: page.total_pages,
            has_next_page: page.page < page.total_pages,
            has_prev_page: page.page > 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsDto {
    pub total: u64,
    pub used: u64,
    pub unused: u64,
    pub ignored: u64,
}

impl From<KeywordStats> for StatsDto {
    fn from(stats: KeywordStats) -> Self {
        Self {
            total: stats.total,
            used: stats.used,
            unused: stats.unused,
            ignored: stats.ignored,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct KeywordListResponse {
    pub keywords: Vec<KeywordDto>,
    pub pagination: PaginationDto,
    pub stats: StatsDto,
}

#[derive(Debug, Serialize)]
pub struct KeywordSnapshotResponse {
    pub total: u64,
    pub keywords: Vec<KeywordDto>,
    pub sample: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateKeywordRequest {
    pub keyword: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub trend_percentage: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CreateKeywordResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UseBatchRequest {
    pub keywords: Vec<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UseBatchResponse {
    pub success: bool,
    pub updated: u64,
}

#[derive(Debug, Deserialize)]
pub struct IgnoreKeywordRequest {
    #[serde(rename = "keywordId")]
    pub keyword_id: i32,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct AddDefaultKeywordRequest {
    pub keyword: String,
}

#[derive(Debug, Serialize)]
pub struct DefaultKeywordsResponse {
    pub success: bool,
    pub keywords: Vec<String>,
}
