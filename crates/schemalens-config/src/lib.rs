//! SchemaLens Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.schemalens/config.toml`
//! - Local config: `.schemalens/config.toml` (in the working directory)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};

/// Root configuration for SchemaLens.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LensConfig {
    /// Connection defaults
    pub connection: ConnectionConfig,

    /// Analysis run configuration
    pub analysis: AnalysisConfig,

    /// Implicit relationship report filtering
    pub inference: InferenceConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Connection defaults applied when the CLI flags leave them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Default dialect name (parsed by the provider layer)
    pub dialect: String,

    /// Default target database; empty means provider default / server mode
    pub database: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            dialect: "sqlite".to_string(),
            database: None,
        }
    }
}

/// Analysis run configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Analyzer names to run; empty means all
    pub analyzers: Vec<String>,
}

/// Report-side filtering of implicit relationship candidates.
///
/// The inference engine's own stemming and confidence constants are code
/// policy; these values only shape what the report shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Hide candidates below this confidence
    pub min_confidence: f64,

    /// Cap the number of reported candidates (0 = unlimited)
    pub max_candidates: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            max_candidates: 50,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON structured logging
    Json,
}

/// CLI overrides for configuration values.
///
/// Used to apply command-line arguments over file-based config.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override dialect
    pub dialect: Option<String>,

    /// Override target database
    pub database: Option<String>,

    /// Override analyzer selection
    pub analyzers: Option<Vec<String>>,

    /// Override log level
    pub log_level: Option<String>,
}

impl LensConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref dialect) = overrides.dialect {
            self.connection.dialect = dialect.clone();
        }

        if let Some(ref database) = overrides.database {
            self.connection.database = Some(database.clone());
        }

        if let Some(ref analyzers) = overrides.analyzers {
            self.analysis.analyzers = analyzers.clone();
        }

        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.inference.min_confidence) {
            return Err(ConfigError::invalid_value(
                "inference.min_confidence",
                "must be between 0.0 and 1.0",
            ));
        }
        Ok(())
    }
}
