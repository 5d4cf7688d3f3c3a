//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub labels: LabelsConfig,
    pub delivery: DeliveryConfig,
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Label mapping and normalization configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LabelsConfig {
    #[serde(default = "default_mapping_path")]
    pub mapping_path: String,
    #[serde(default = "default_irrelevant_class_name")]
    pub irrelevant_class_name: String,
    /// Separator joining multilabel predictions in a raw token
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_mapping_path() -> String {
    "config/mapping.yaml".to_string()
}

fn default_irrelevant_class_name() -> String {
    "irrelevant".to_string()
}

fn default_separator() -> String {
    ";".to_string()
}

/// Outbound delivery of batch results
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
    /// Platform endpoint receiving batch predictions; `None` disables delivery
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_delivery_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

fn default_delivery_timeout() -> u64 {
    30000
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_max_concurrent_jobs() -> usize {
    4
}

/// Fan-out settings for the aggregator
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AggregationConfig {
    #[serde(default = "default_max_concurrent_texts")]
    pub max_concurrent_texts: usize,
}

fn default_max_concurrent_texts() -> usize {
    4
}

/// Triton backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Model name as known to the Triton server; unique across the registry
    pub model_name: String,

    /// Base url without port, e.g. `http://triton-1`
    pub url: String,

    pub port: u16,

    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_timeout() -> u64 {
    60000
}

impl BackendConfig {
    pub fn new(model_name: impl Into<String>, url: impl Into<String>, port: u16) -> Self {
        Self {
            model_name: model_name.into(),
            url: url.into(),
            port,
            timeout_ms: default_timeout(),
        }
    }

    /// Base of the Triton v2 REST API for this backend
    pub fn base_url(&self) -> String {
        format!("{}:{}/v2", self.url.trim_end_matches('/'), self.port)
    }
}

/// YAML backends configuration file structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct BackendsConfig {
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_paths("config/gateway.yaml", Some("config/backends.yaml"))
    }

    /// Load settings from YAML (or TOML) configuration files
    pub fn load_from_paths<P: AsRef<Path>>(
        gateway_config: P,
        backends_config: Option<P>,
    ) -> Result<Self> {
        let gateway_path = gateway_config.as_ref();

        let format = if gateway_path
            .extension()
            .map_or(false, |ext| ext == "yaml" || ext == "yml")
        {
            FileFormat::Yaml
        } else {
            FileFormat::Toml
        };

        let mut config_builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            .set_default("labels.mapping_path", default_mapping_path())?
            .set_default("labels.irrelevant_class_name", default_irrelevant_class_name())?
            .set_default("labels.separator", default_separator())?
            .set_default("delivery.timeout_ms", default_delivery_timeout() as i64)?
            .set_default("delivery.queue_capacity", default_queue_capacity() as i64)?
            .set_default("delivery.max_concurrent_jobs", default_max_concurrent_jobs() as i64)?
            .set_default(
                "aggregation.max_concurrent_texts",
                default_max_concurrent_texts() as i64,
            )?;

        if gateway_path.exists() {
            config_builder = config_builder.add_source(File::from(gateway_path).format(format));
        }

        config_builder = config_builder.add_source(
            Environment::with_prefix("ZOO_GATEWAY")
                .separator("__")
                .try_parsing(true),
        );

        let config = config_builder.build()?;
        let mut settings: Settings = config.try_deserialize()?;

        // A separate backends file replaces the inline list
        if let Some(backends_path) = backends_config {
            let backends_path = backends_path.as_ref();
            if backends_path.exists() {
                settings.backends = Self::load_backends_config(backends_path)?.backends;
            }
        }

        Ok(settings)
    }

    /// Load backends configuration from YAML file
    pub fn load_backends_config<P: AsRef<Path>>(path: P) -> Result<BackendsConfig> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::Config(config::ConfigError::Message(format!(
                "Failed to read backends config: {}",
                e
            )))
        })?;

        let config: BackendsConfig = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Config(config::ConfigError::Message(format!(
                "Failed to parse backends config: {}",
                e
            )))
        })?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }

        if self.labels.separator.is_empty() {
            return Err(invalid("Label separator cannot be empty"));
        }
        if self.labels.irrelevant_class_name.is_empty() {
            return Err(invalid("Irrelevant class name cannot be empty"));
        }

        if self.delivery.queue_capacity == 0 {
            return Err(invalid("Delivery queue capacity must be positive"));
        }
        if self.delivery.max_concurrent_jobs == 0 {
            return Err(invalid("Delivery concurrency must be positive"));
        }
        if self.aggregation.max_concurrent_texts == 0 {
            return Err(invalid("Aggregation concurrency must be positive"));
        }

        for backend in &self.backends {
            if backend.model_name.is_empty() {
                return Err(invalid("Backend model name cannot be empty"));
            }
            if backend.url.is_empty() {
                return Err(invalid(&format!(
                    "Backend '{}' must have a url",
                    backend.model_name
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
            labels: LabelsConfig {
                mapping_path: default_mapping_path(),
                irrelevant_class_name: default_irrelevant_class_name(),
                separator: default_separator(),
            },
            delivery: DeliveryConfig {
                endpoint: None,
                timeout_ms: default_delivery_timeout(),
                queue_capacity: default_queue_capacity(),
                max_concurrent_jobs: default_max_concurrent_jobs(),
            },
            aggregation: AggregationConfig {
                max_concurrent_texts: default_max_concurrent_texts(),
            },
            backends: vec![],
        }
    }
}
