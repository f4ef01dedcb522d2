//! Serializable ingestion configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file
//! at all) describes a complete run against the exchange's public pages:
//!
//! ```toml
//! [source]
//! catalog_url = "https://www.mse.mk/en/stats/symbolhistory/kmb"
//! history_url = "https://www.mse.mk/en/stats/symbolhistory"
//! timeout_secs = 30
//!
//! [store]
//! path = "data/transactions.db"
//!
//! [ingest]
//! workers = 4
//! ```

use eodlab_core::data::{
    default_columns, ColumnMap, ColumnMapError, ColumnSpec, HttpSettings, RetryPolicy,
    DEFAULT_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS, MAX_WINDOW_DAYS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid column map: {0}")]
    Columns(#[from] ColumnMapError),
}

/// Complete configuration for an ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub source: SourceConfig,
    pub store: StoreConfig,
    pub ingest: IngestSettings,
    /// History table layout; defaults to the exchange's current header.
    pub columns: Vec<ColumnSpec>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            store: StoreConfig::default(),
            ingest: IngestSettings::default(),
            columns: default_columns(),
        }
    }
}

/// Where and how to reach the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Page listing every instrument in a `<select>` control.
    pub catalog_url: String,
    /// `id` of the `<select>` holding the issuer codes.
    pub catalog_select_id: String,
    /// History endpoint; the issuer code is appended as a path segment.
    pub history_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Pause before the single retry after a 503.
    pub retry_delay_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            catalog_url: "https://www.mse.mk/en/stats/symbolhistory/kmb".into(),
            catalog_select_id: "Code".into(),
            history_url: "https://www.mse.mk/en/stats/symbolhistory".into(),
            timeout_secs: 30,
            user_agent: HttpSettings::default().user_agent,
            retry_delay_ms: 1000,
        }
    }
}

impl SourceConfig {
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_delay(Duration::from_millis(self.retry_delay_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/transactions.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// History depth for issuers with nothing stored yet.
    pub lookback_days: u64,
    /// Request window; the source caps it at 365.
    pub window_days: u64,
    /// Issuers fetched concurrently. 1 keeps the pipeline sequential.
    pub workers: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            window_days: MAX_WINDOW_DAYS,
            workers: 1,
        }
    }
}

impl IngestConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject settings the pipeline cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingest.workers == 0 {
            return Err(ConfigError::Invalid("ingest.workers must be at least 1".into()));
        }
        if self.ingest.window_days == 0 || self.ingest.window_days > MAX_WINDOW_DAYS {
            return Err(ConfigError::Invalid(format!(
                "ingest.window_days must be within 1..={MAX_WINDOW_DAYS}, got {}",
                self.ingest.window_days
            )));
        }
        if self.ingest.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::Invalid(format!(
                "ingest.lookback_days must be at most {MAX_LOOKBACK_DAYS}, got {}",
                self.ingest.lookback_days
            )));
        }
        if self.source.timeout_secs == 0 {
            return Err(ConfigError::Invalid("source.timeout_secs must be positive".into()));
        }
        if self.source.catalog_url.trim().is_empty() || self.source.history_url.trim().is_empty() {
            return Err(ConfigError::Invalid("source URLs must not be empty".into()));
        }
        self.column_map()?;
        Ok(())
    }

    /// Build the validated column map.
    pub fn column_map(&self) -> Result<ColumnMap, ConfigError> {
        Ok(ColumnMap::new(&self.columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eodlab_core::data::Field;

    #[test]
    fn empty_file_is_the_default_config() {
        let config = IngestConfig::from_toml("").unwrap();
        assert_eq!(config, IngestConfig::default());
        assert_eq!(config.ingest.lookback_days, 3650);
        assert_eq!(config.ingest.window_days, 365);
        assert_eq!(config.ingest.workers, 1);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = IngestConfig::from_toml(
            r#"
            [store]
            path = "/tmp/stocks.db"

            [ingest]
            workers = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.store.path, PathBuf::from("/tmp/stocks.db"));
        assert_eq!(config.ingest.workers, 4);
        assert_eq!(config.ingest.window_days, 365);
        assert_eq!(config.source, SourceConfig::default());
    }

    #[test]
    fn toml_roundtrip() {
        let config = IngestConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[[columns]]"));
        assert_eq!(IngestConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = IngestConfig::from_toml("[ingest]\nworkers = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn oversized_window_is_rejected() {
        let err = IngestConfig::from_toml("[ingest]\nwindow_days = 400").unwrap_err();
        assert!(err.to_string().contains("window_days"));
    }

    #[test]
    fn lookback_is_bounded() {
        let err = IngestConfig::from_toml("[ingest]\nlookback_days = 10000000").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("lookback_days"));

        let config = IngestConfig::from_toml("[ingest]\nlookback_days = 36500").unwrap();
        assert_eq!(config.ingest.lookback_days, MAX_LOOKBACK_DAYS);
    }

    #[test]
    fn custom_columns_are_validated_at_load() {
        let err = IngestConfig::from_toml(
            r#"
            [[columns]]
            label = "Date"
            field = "date"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Columns(ColumnMapError::UnmappedField(_))));
    }

    #[test]
    fn custom_columns_override_labels() {
        let mut config = IngestConfig::default();
        for spec in &mut config.columns {
            if spec.field == Some(Field::LastTradePrice) {
                spec.label = "Last price".into();
            }
        }
        let reparsed = IngestConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        let map = reparsed.column_map().unwrap();
        assert!(map.role_of("Last price").is_some());
        assert!(map.role_of("Last trade price").is_none());
    }
}
