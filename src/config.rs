use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::{ImporterError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub store: StoreConfig,
    pub validation: ValidationConfig,
    pub publisher: PublisherConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Csv,
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WriterKind {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PublisherKind {
    Log,
    File,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub path: Option<PathBuf>,
    pub has_headers: bool,
    pub synthetic_count: usize,
    pub seed: Option<u64>,
    pub channel_capacity: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Synthetic,
            path: None,
            has_headers: false,
            synthetic_count: DEFAULT_SYNTHETIC_COUNT,
            seed: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: WriterKind,
    pub database_path: PathBuf,
    /// Unset means one concurrent insert per valid product, without limit
    pub max_in_flight: Option<usize>,
    pub output_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: WriterKind::Sqlite,
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            max_in_flight: None,
            output_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub require_name: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    pub kind: PublisherKind,
    pub topic: String,
    pub output_path: PathBuf,
    pub url: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            kind: PublisherKind::Log,
            topic: PRODUCT_CREATED_TOPIC.to_string(),
            output_path: PathBuf::from(DEFAULT_EVENTS_PATH),
            url: None,
            timeout_seconds: DEFAULT_PUBLISH_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: DEFAULT_LOG_DIR.to_string(),
            file_name: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub port: Option<u16>,
}

impl Config {
    /// Loads the TOML file at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            ImporterError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup(ENV_SOURCE_PATH) {
            self.source.path = Some(PathBuf::from(path));
            self.source.kind = SourceKind::Csv;
        }
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            self.store.database_path = PathBuf::from(path);
        }
        if let Some(url) = lookup(ENV_PUBLISHER_URL) {
            self.publisher.url = Some(url);
        }
        if let Some(port) = lookup(ENV_METRICS_PORT) {
            let port = port
                .parse()
                .map_err(|e| ImporterError::Config(format!("{} must be a port number: {}", ENV_METRICS_PORT, e)))?;
            self.metrics.port = Some(port);
        }
        Ok(())
    }

    /// Checks the combinations a run needs before anything is opened.
    pub fn validate(&self) -> Result<()> {
        if self.source.kind == SourceKind::Csv && self.source.path.is_none() {
            return Err(ImporterError::Config("csv source requires a path".to_string()));
        }
        if self.publisher.kind == PublisherKind::Http && self.publisher.url.is_none() {
            return Err(ImporterError::Config("http publisher requires a url".to_string()));
        }
        if self.store.max_in_flight == Some(0) {
            return Err(ImporterError::Config("store.max_in_flight must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_document_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.source.kind, SourceKind::Synthetic);
        assert_eq!(config.source.synthetic_count, DEFAULT_SYNTHETIC_COUNT);
        assert_eq!(config.store.kind, WriterKind::Sqlite);
        assert_eq!(config.store.max_in_flight, None);
        assert_eq!(config.publisher.topic, PRODUCT_CREATED_TOPIC);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_sections() {
        let config = Config::from_toml_str(
            r#"
            [source]
            kind = "csv"
            path = "data/products.csv"
            has_headers = true

            [store]
            kind = "memory"
            max_in_flight = 16

            [publisher]
            kind = "http"
            url = "http://localhost:8222"
            "#,
        )
        .unwrap();
        assert_eq!(config.source.kind, SourceKind::Csv);
        assert!(config.source.has_headers);
        assert_eq!(config.store.kind, WriterKind::Memory);
        assert_eq!(config.store.max_in_flight, Some(16));
        assert_eq!(config.publisher.kind, PublisherKind::Http);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_SOURCE_PATH, "/tmp/p.csv"),
            (ENV_DATABASE_PATH, "/tmp/c.db"),
            (ENV_METRICS_PORT, "9100"),
        ]);
        let mut config = Config::default();
        config
            .apply_env_from(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.source.kind, SourceKind::Csv);
        assert_eq!(config.source.path, Some(PathBuf::from("/tmp/p.csv")));
        assert_eq!(config.store.database_path, PathBuf::from("/tmp/c.db"));
        assert_eq!(config.metrics.port, Some(9100));
    }

    #[test]
    fn bad_metrics_port_is_a_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_env_from(|k| (k == ENV_METRICS_PORT).then(|| "abc".to_string()))
            .unwrap_err();
        assert!(matches!(err, ImporterError::Config(_)));
    }

    #[test]
    fn incomplete_combinations_are_rejected() {
        let mut config = Config::default();
        config.source.kind = SourceKind::Csv;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.publisher.kind = PublisherKind::Http;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load(Path::new("/no/such/catalog-importer.toml")).unwrap();
        assert_eq!(config.store.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
    }
}
