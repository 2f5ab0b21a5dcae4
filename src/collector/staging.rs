//! Session-scoped staging of extracted candidates.
//!
//! Candidates accumulate here between captures and are flushed to the
//! ingestion service in one commit. Keyed by exact term text, last write
//! wins, so re-parsing the same payload never inflates the cache.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{info, warn};

use super::extract::CandidateTerm;
use super::ingest::IngestClient;

#[derive(Default)]
pub struct StagingCache {
    terms: Mutex<HashMap<String, CandidateTerm>>,
}

/// Outcome of a single commit pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl StagingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a candidate. Returns true when the term was not already staged.
    pub fn put(&self, candidate: CandidateTerm) -> bool {
        let mut terms = self.terms.lock().expect("staging lock poisoned");
        terms.insert(candidate.text.clone(), candidate).is_none()
    }

    pub fn size(&self) -> usize {
        self.terms.lock().expect("staging lock poisoned").len()
    }

    /// Drop all staged terms, returning how many were held.
    pub fn clear(&self) -> usize {
        let mut terms = self.terms.lock().expect("staging lock poisoned");
        let held = terms.len();
        terms.clear();
        held
    }

    fn snapshot(&self) -> Vec<CandidateTerm> {
        self.terms
            .lock()
            .expect("staging lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Post every staged term to the ingestion service, one request per
    /// term, then clear the cache regardless of per-term outcomes. A term
    /// that fails to land is dropped, not retried; the next capture of the
    /// same trend re-stages it.
    pub async fn commit(&self, client: &IngestClient) -> CommitReport {
        let staged = self.snapshot();
        let attempted = staged.len();
        let mut succeeded = 0;

        for candidate in &staged {
            match client.create_keyword(candidate).await {
                Ok(_) => succeeded += 1,
                Err(err) => warn!("Failed to submit '{}': {err}", candidate.text),
            }
        }

        self.clear();

        let report = CommitReport {
            attempted,
            succeeded,
            failed: attempted - succeeded,
        };
        if report.attempted > 0 {
            info!(
                "Committed staging cache: {}/{} terms accepted",
                report.succeeded, report.attempted
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(text: &str, score: f64) -> CandidateTerm {
        CandidateTerm {
            text: text.to_string(),
            score,
            is_breakout: false,
            source_tag: "extension-observed".to_string(),
        }
    }

    #[test]
    fn put_reports_newness() {
        let cache = StagingCache::new();
        assert!(cache.put(candidate("solar eclipse", 450.0)));
        assert!(!cache.put(candidate("solar eclipse", 500.0)));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn duplicate_terms_keep_the_last_write() {
        let cache = StagingCache::new();
        cache.put(candidate("meteor shower", 310.0));
        cache.put(candidate("meteor shower", 620.0));

        let staged = cache.snapshot();
        assert_eq!(staged.len(), 1);
        assert!((staged[0].score - 620.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clear_empties_and_reports_count() {
        let cache = StagingCache::new();
        cache.put(candidate("one", 300.0));
        cache.put(candidate("two", 301.0));

        assert_eq!(cache.clear(), 2);
        assert_eq!(cache.size(), 0);
    }
}
