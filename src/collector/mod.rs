//! Trend collection pipeline: intercept, parse, stage, submit.
//!
//! A [`CollectorSession`] owns the staging cache and a parse worker fed by
//! every tap created through [`CollectorSession::tap`]. Captures flow
//! capture channel -> extraction -> staging; each batch of newly found terms
//! is also announced on a broadcast channel for observers.

pub mod extract;
pub mod ingest;
pub mod intercept;
pub mod staging;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub use extract::{CandidateTerm, ExtractionRules, ParseError};
pub use ingest::{IngestClient, IngestError};
pub use intercept::{
    CapturedResponse, InterceptingTransport, PageRequest, PageResponse, ReplayTransport, Transport,
};
pub use staging::{CommitReport, StagingCache};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Announcements emitted by the parse worker.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectorEvent {
    KeywordsFound { keywords: Vec<FoundKeyword> },
}

#[derive(Debug, Clone, Serialize)]
pub struct FoundKeyword {
    pub keyword: String,
    pub value: f64,
}

pub struct CollectorSession {
    staging: Arc<StagingCache>,
    events: broadcast::Sender<CollectorEvent>,
    captures: mpsc::UnboundedSender<CapturedResponse>,
    worker: JoinHandle<()>,
}

impl CollectorSession {
    pub fn start(rules: ExtractionRules) -> Self {
        let staging = Arc::new(StagingCache::new());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (captures, rx) = mpsc::unbounded_channel();

        let worker = tokio::spawn(parse_worker(rx, rules, staging.clone(), events.clone()));

        Self {
            staging,
            events,
            captures,
            worker,
        }
    }

    /// Wrap a transport so its matching responses feed this session.
    pub fn tap<T: Transport>(&self, inner: T, monitored_fragment: &str) -> InterceptingTransport<T> {
        InterceptingTransport::new(inner, monitored_fragment, self.captures.clone())
    }

    pub fn staging(&self) -> &Arc<StagingCache> {
        &self.staging
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CollectorEvent> {
        self.events.subscribe()
    }

    /// Close the capture channel and wait for the worker to drain. Taps
    /// created from this session must be dropped first or the worker never
    /// sees the channel close.
    pub async fn close(self) {
        let Self {
            captures, worker, ..
        } = self;
        drop(captures);
        let _ = worker.await;
    }
}

async fn parse_worker(
    mut rx: mpsc::UnboundedReceiver<CapturedResponse>,
    rules: ExtractionRules,
    staging: Arc<StagingCache>,
    events: broadcast::Sender<CollectorEvent>,
) {
    while let Some(captured) = rx.recv().await {
        match extract::extract_terms(&captured.body, &rules) {
            Ok(candidates) if !candidates.is_empty() => {
                let found: Vec<FoundKeyword> = candidates
                    .iter()
                    .map(|c| FoundKeyword {
                        keyword: c.text.clone(),
                        value: c.score,
                    })
                    .collect();

                for candidate in candidates {
                    staging.put(candidate);
                }
                info!(
                    "Staged {} terms from {} ({} total staged)",
                    found.len(),
                    captured.url,
                    staging.size()
                );

                // No subscribers is fine; staging already happened.
                let _ = events.send(CollectorEvent::KeywordsFound { keywords: found });
            }
            Ok(_) => {}
            Err(err) => {
                warn!("Unparseable capture from {}: {err}", captured.url);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticTransport {
        body: String,
    }

    #[async_trait]
    impl Transport for StaticTransport {
        async fn send(&self, _request: &PageRequest) -> anyhow::Result<PageResponse> {
            Ok(PageResponse {
                status: 200,
                body: self.body.clone(),
            })
        }
    }

    #[tokio::test]
    async fn captures_flow_into_staging_and_events() {
        let session = CollectorSession::start(ExtractionRules::default());
        let mut events = session.subscribe();

        let tap = session.tap(
            StaticTransport {
                body: r#")]}'{"items":[{"query":"lunar eclipse","value":480}]}"#.to_string(),
            },
            "/trends/api",
        );
        tap.send(&PageRequest::get("https://example.com/trends/api/explore"))
            .await
            .unwrap();

        let CollectorEvent::KeywordsFound { keywords } = events.recv().await.unwrap();
        assert_eq!(keywords.len(), 1);
        assert_eq!(keywords[0].keyword, "lunar eclipse");
        assert_eq!(session.staging().size(), 1);

        drop(tap);
        session.close().await;
    }

    #[tokio::test]
    async fn bad_payloads_are_swallowed_by_the_worker() {
        let session = CollectorSession::start(ExtractionRules::default());
        let staging = session.staging().clone();

        let tap = session.tap(
            StaticTransport {
                body: "not json at all".to_string(),
            },
            "/trends/api",
        );
        tap.send(&PageRequest::get("https://example.com/trends/api/explore"))
            .await
            .unwrap();

        drop(tap);
        session.close().await;
        assert_eq!(staging.size(), 0);
    }
}
