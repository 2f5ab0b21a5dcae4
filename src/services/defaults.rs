//! The ordered default-keyword list, persisted as a JSON array on disk.
//!
//! Newest entries sit at the front. Submitted values that look like URLs are
//! reduced to their last path segment with dashes turned into spaces, so
//! pasting a trends link stores the readable term.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use url::Url;

pub struct DefaultKeywordList {
    path: PathBuf,
}

impl DefaultKeywordList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current list. A missing file is an empty list, not an error.
    pub async fn read(&self) -> Result<Vec<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Malformed keyword list: {}", self.path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err).with_context(|| {
                format!("Failed to read keyword list: {}", self.path.display())
            }),
        }
    }

    /// Prepend a keyword and persist. The stored value is the processed
    /// form; an entry already present is moved to the front rather than
    /// duplicated. Returns the updated list.
    pub async fn prepend(&self, raw: &str) -> Result<Vec<String>> {
        let keyword = process_keyword(raw);
        anyhow::ensure!(!keyword.is_empty(), "keyword cannot be empty");

        let mut keywords = self.read().await?;
        keywords.retain(|existing| existing != &keyword);
        keywords.insert(0, keyword.clone());

        self.write(&keywords).await?;
        info!("Added default keyword '{}'", keyword);
        Ok(keywords)
    }

    async fn write(&self, keywords: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(keywords)?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write keyword list: {}", self.path.display()))
    }
}

/// Reduce a URL to its last non-empty path segment with dashes as spaces;
/// anything that does not parse as an http(s) URL is just trimmed.
#[must_use]
pub fn process_keyword(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Ok(url) = Url::parse(trimmed) {
        if matches!(url.scheme(), "http" | "https") {
            if let Some(segment) = url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            {
                return segment.replace('-', " ").trim().to_string();
            }
        }
    }

    trimmed.to_string()
}
