//! HTTP client for the keyword ingestion service.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::extract::CandidateTerm;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("request to keyword service failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("keyword service rejected '{keyword}': {message}")]
    Rejected { keyword: String, message: String },
}

#[derive(Debug, Serialize)]
struct CreateKeywordRequest<'a> {
    keyword: &'a str,
    source: &'a str,
    trend_percentage: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateKeywordReply {
    pub success: bool,
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}

pub struct IngestClient {
    http: reqwest::Client,
    base_url: String,
}

impl IngestClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Submit one candidate. The service deduplicates on exact term text,
    /// so an already-known keyword still comes back with success true.
    pub async fn create_keyword(
        &self,
        candidate: &CandidateTerm,
    ) -> Result<CreateKeywordReply, IngestError> {
        let body = CreateKeywordRequest {
            keyword: &candidate.text,
            source: &candidate.source_tag,
            trend_percentage: candidate.score,
        };

        let reply: CreateKeywordReply = self
            .http
            .post(format!("{}/api/keywords", self.base_url))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if reply.success {
            debug!("Submitted '{}' (id {:?})", candidate.text, reply.id);
            Ok(reply)
        } else {
            Err(IngestError::Rejected {
                keyword: candidate.text.clone(),
                message: reply
                    .message
                    .unwrap_or_else(|| "no reason given".to_string()),
            })
        }
    }
}
