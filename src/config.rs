//! Engine configuration.
//!
//! Loaded from a TOML file; every field has a default so an empty file (or no
//! file at all) yields a working single-instrument book.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::orderbook::risk::DEFAULT_MAX_POSITION;
use crate::orderbook::types::Position;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Instrument label used in logs and snapshots
    pub symbol: String,
    /// Largest absolute aggregate resting position the risk gate accepts
    pub max_position: Position,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Seconds between periodic metric summaries
    pub report_interval_secs: u64,
    /// Address for the Prometheus `/metrics` listener, e.g. "0.0.0.0:9090"
    pub prometheus_listen: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: "DEFAULT".to_string(),
            max_position: DEFAULT_MAX_POSITION,
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 5,
            prometheus_listen: None,
        }
    }
}

impl EngineConfig {
    /// Load and validate config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".to_string()));
        }
        if self.max_position < 0 {
            return Err(ConfigError::Invalid(format!(
                "max_position must be non-negative, got {}",
                self.max_position
            )));
        }
        if self.metrics.report_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "metrics.report_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Failed to read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.max_position, 100);
        assert_eq!(config.metrics.report_interval_secs, 5);
    }

    #[test]
    fn test_parse_full_config() {
        let config = EngineConfig::from_toml_str(
            r#"
            symbol = "BTC-USD"
            max_position = 2500

            [metrics]
            report_interval_secs = 10
            prometheus_listen = "127.0.0.1:9100"
            "#,
        )
        .unwrap();

        assert_eq!(config.symbol, "BTC-USD");
        assert_eq!(config.max_position, 2500);
        assert_eq!(config.metrics.report_interval_secs, 10);
        assert_eq!(
            config.metrics.prometheus_listen.as_deref(),
            Some("127.0.0.1:9100")
        );
    }

    #[test]
    fn test_rejects_negative_limit() {
        let err = EngineConfig::from_toml_str("max_position = -1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = EngineConfig::from_toml_str("max_position = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load(Path::new("/nonexistent/engine.toml")).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read config"));
    }
}
