//! Configuration file (`xform.yml`)

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use xform_query::EvaluatorConfig;
use xform_schema::{HashAlgorithm, DEFAULT_RETENTION_DISCOVERY_DAYS};

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "xform.yml";

/// Complete configuration - can be loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct XformConfig {
    /// Expression evaluation settings
    pub evaluator: EvaluatorSettings,
    /// Schema record indexing settings
    pub schema: SchemaSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Expression evaluation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorSettings {
    /// Maximum concurrent backend fetches per query
    pub max_concurrent_fetches: usize,
    /// Query timeout in seconds (0 disables the timeout)
    pub query_timeout_secs: u64,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 16,
            query_timeout_secs: 30,
        }
    }
}

/// Schema record indexing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Document id hash: "xxhash128" or "xxhash64"
    pub hash_algorithm: HashAlgorithm,
    /// Retention for records that do not carry one, in days
    pub default_retention_days: u32,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            hash_algorithm: HashAlgorithm::default(),
            default_retention_days: DEFAULT_RETENTION_DISCOVERY_DAYS,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Include target in logs
    pub show_target: bool,
    /// Include thread IDs in logs
    pub show_thread_ids: bool,
    /// Include file and line numbers
    pub show_location: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            show_target: true,
            show_thread_ids: false,
            show_location: false,
        }
    }
}

impl XformConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: XformConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Write default config to a file
    pub fn write_default(path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(&Self::default())?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Convert to EvaluatorConfig
    pub fn to_evaluator_config(&self) -> EvaluatorConfig {
        let timeout = match self.evaluator.query_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        EvaluatorConfig {
            max_concurrent_fetches: self.evaluator.max_concurrent_fetches,
            timeout,
        }
    }

    /// Log level directive, normalized to one of the tracing levels
    pub fn log_level(&self) -> &'static str {
        match self.logging.level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "error" => "error",
            _ => "warn",
        }
    }
}
