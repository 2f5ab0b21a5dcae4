use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::collector::ExtractionRules;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub collector: CollectorConfig,

    pub extraction: ExtractionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            collector: CollectorConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// JSON file holding the ordered default-keyword list.
    pub defaults_path: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/trendarr.db".to_string(),
            log_level: "info".to_string(),
            defaults_path: "data/defaultkw.json".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 6791,
            cors_allowed_origins: vec![
                "http://localhost:6791".to_string(),
                "http://127.0.0.1:6791".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Base URL of the ingestion service the collector submits to.
    pub api_base_url: String,

    /// URL fragment identifying responses worth capturing.
    pub monitored_endpoint: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:6791".to_string(),
            monitored_endpoint: "/trends/api".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum magnitude for a term to be kept (inclusive).
    pub significance_threshold: f64,

    /// Alias keys tried, in order, for the term text.
    pub term_keys: Vec<String>,

    /// Alias keys tried, in order, for the magnitude.
    pub magnitude_keys: Vec<String>,

    /// Marker words that flag a term as breakout regardless of magnitude.
    pub breakout_markers: Vec<String>,

    /// Provenance tag attached to every submitted term.
    pub source_tag: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let rules = ExtractionRules::default();
        Self {
            significance_threshold: rules.significance_threshold,
            term_keys: rules.term_keys,
            magnitude_keys: rules.magnitude_keys,
            breakout_markers: rules.breakout_markers,
            source_tag: rules.source_tag,
        }
    }
}

impl ExtractionConfig {
    #[must_use]
    pub fn rules(&self) -> ExtractionRules {
        ExtractionRules {
            term_keys: self.term_keys.clone(),
            magnitude_keys: self.magnitude_keys.clone(),
            significance_threshold: self.significance_threshold,
            breakout_markers: self
                .breakout_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
            source_tag: self.source_tag.clone(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("trendarr").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".trendarr").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.extraction.term_keys.is_empty() {
            anyhow::bail!("At least one term key is required for extraction");
        }

        if self.extraction.magnitude_keys.is_empty() {
            anyhow::bail!("At least one magnitude key is required for extraction");
        }

        if self.extraction.significance_threshold < 0.0 {
            anyhow::bail!("Significance threshold cannot be negative");
        }

        if self.collector.api_base_url.is_empty() {
            anyhow::bail!("Collector API base URL cannot be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 6791);
        assert!((config.extraction.significance_threshold - 300.0).abs() < f64::EPSILON);
        assert_eq!(config.extraction.term_keys[0], "query");
        assert_eq!(config.extraction.source_tag, "extension-observed");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[collector]"));
        assert!(toml_str.contains("[extraction]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [extraction]
            significance_threshold = 450.0
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert!((config.extraction.significance_threshold - 450.0).abs() < f64::EPSILON);

        assert_eq!(config.collector.api_base_url, "http://localhost:6791");
    }

    #[test]
    fn test_validate_rejects_empty_term_keys() {
        let mut config = Config::default();
        config.extraction.term_keys.clear();
        assert!(config.validate().is_err());
    }
}
