//! Configuration management for streamfold
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! environment variables prefixed with `STREAMFOLD_` where `__` separates
//! nesting levels (`STREAMFOLD_PROCESSOR__RUNNER__WINDOW_SIZE_MS=30000`).

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use processor::catalog::CatalogSchema;
use processor::config::ProcessorConfig;
use processor::record::Path;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main streamfold configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StreamfoldConfig {
    /// Stage selection
    #[serde(default)]
    pub stage: StageConfig,

    /// Reference catalog location
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Stage processor settings
    #[serde(default)]
    pub processor: ProcessorConfig,

    /// Observability settings
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl StreamfoldConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(StreamfoldConfig::default()));

        // Load from file if provided
        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        }

        // Override with environment variables (prefixed with STREAMFOLD_)
        figment = figment.merge(Env::prefixed("STREAMFOLD_").split("__"));

        figment.extract().map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.processor
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        self.stage.event_time_path()?;

        if let Some(field) = &self.catalog.children_field {
            if field.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "catalog.children_field must not be empty".to_string(),
                ));
            }
        }

        if self.observability.log_level.trim().is_empty() {
            return Err(ConfigError::ValidationError("Log level required".to_string()));
        }

        Ok(())
    }
}

/// Stage selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StageConfig {
    /// Stage to run when none is given on the command line
    pub udf: Option<String>,

    /// Field holding the event time of raw inputs (RFC3339 or epoch millis);
    /// processing time is used when unset
    pub event_time_field: Option<String>,
}

impl StageConfig {
    /// Parsed event time field
    pub fn event_time_path(&self) -> Result<Option<Path>> {
        self.event_time_field
            .as_deref()
            .map(Path::parse)
            .transpose()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Reference catalog location
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    /// Catalog document
    pub path: Option<PathBuf>,

    /// Overrides the stage's child list field name
    pub children_field: Option<String>,
}

impl CatalogConfig {
    /// The stage's schema with any configured override applied
    pub fn schema(&self, stage_default: CatalogSchema) -> CatalogSchema {
        match &self.children_field {
            Some(field) => CatalogSchema::new(field.clone()),
            None => stage_default,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservabilityConfig {
    /// Log level or filter directive; `RUST_LOG` takes precedence
    pub log_level: String,

    /// Log line format
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = StreamfoldConfig::default();
        assert_eq!(config.observability.log_level, "info");
        assert_eq!(config.processor.runner.window_size_ms, 60_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = StreamfoldConfig::default();
        config.processor.runner.channel_buffer = 0;
        assert!(config.validate().is_err());

        config.processor.runner.channel_buffer = 16;
        config.stage.event_time_field = Some("a..b".to_string());
        assert!(config.validate().is_err());

        config.stage.event_time_field = Some("order_time".to_string());
        config.observability.log_level = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "stage:\n  udf: flatmap\n  event_time_field: order_time\n\
             catalog:\n  path: /etc/streamfold/products.json\n\
             processor:\n  runner:\n    window_size_ms: 30000\n\
             observability:\n  log_format: json"
        )
        .unwrap();

        let config = StreamfoldConfig::load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.stage.udf.as_deref(), Some("flatmap"));
        assert_eq!(
            config.catalog.path,
            Some(PathBuf::from("/etc/streamfold/products.json"))
        );
        assert_eq!(config.processor.runner.window_size_ms, 30_000);
        assert_eq!(config.processor.runner.channel_buffer, 500);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.stage.event_time_path().unwrap().is_some());
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "streamfold.yaml",
                "processor:\n  runner:\n    window_size_ms: 30000\n",
            )?;
            jail.set_env("STREAMFOLD_PROCESSOR__RUNNER__WINDOW_SIZE_MS", "5000");
            jail.set_env("STREAMFOLD_OBSERVABILITY__LOG_LEVEL", "debug");

            let config = StreamfoldConfig::load(Some(PathBuf::from("streamfold.yaml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.processor.runner.window_size_ms, 5_000);
            assert_eq!(config.observability.log_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_invalid_yaml_is_load_error() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "processor:\n  runner:\n    window_size_ms: soon").unwrap();

        let err = StreamfoldConfig::load(Some(file.path().to_path_buf())).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn test_catalog_schema_override() {
        let mut catalog = CatalogConfig::default();
        assert_eq!(catalog.schema(CatalogSchema::products()), CatalogSchema::products());

        catalog.children_field = Some("items".to_string());
        assert_eq!(catalog.schema(CatalogSchema::products()).children_field, "items");
    }
}
