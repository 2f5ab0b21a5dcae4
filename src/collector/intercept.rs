//! Transparent response interception.
//!
//! [`InterceptingTransport`] wraps any [`Transport`] and forwards matching
//! response bodies to the parse worker over an unbounded channel. The tap is
//! strictly read-only: the wrapped transport's response reaches the caller
//! unmodified, and a full capture channel or dead worker never turns into a
//! caller-visible error.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct PageRequest {
    pub method: String,
    pub url: String,
}

impl PageRequest {
    pub fn get(url: &str) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

/// A body captured off the wire, queued for parsing.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub url: String,
    pub body: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &PageRequest) -> anyhow::Result<PageResponse>;
}

pub struct InterceptingTransport<T> {
    inner: T,
    monitored_fragment: String,
    captures: mpsc::UnboundedSender<CapturedResponse>,
}

impl<T: Transport> InterceptingTransport<T> {
    pub fn new(
        inner: T,
        monitored_fragment: &str,
        captures: mpsc::UnboundedSender<CapturedResponse>,
    ) -> Self {
        Self {
            inner,
            monitored_fragment: monitored_fragment.to_string(),
            captures,
        }
    }
}

#[async_trait]
impl<T: Transport> Transport for InterceptingTransport<T> {
    async fn send(&self, request: &PageRequest) -> anyhow::Result<PageResponse> {
        let response = self.inner.send(request).await?;

        if request.url.contains(&self.monitored_fragment) {
            debug!("Captured response from {}", request.url);
            let captured = CapturedResponse {
                url: request.url.clone(),
                body: response.body.clone(),
            };
            if self.captures.send(captured).is_err() {
                warn!("Parse worker gone, dropping capture from {}", request.url);
            }
        }

        Ok(response)
    }
}

/// Replays saved payload files as responses, for offline runs against
/// captured traffic.
pub struct ReplayTransport {
    root: PathBuf,
}

impl ReplayTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Transport for ReplayTransport {
    async fn send(&self, request: &PageRequest) -> anyhow::Result<PageResponse> {
        let name = request
            .url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("payload.json");
        let body = tokio::fs::read_to_string(self.root.join(name)).await?;
        Ok(PageResponse { status: 200, body })
    }
}
