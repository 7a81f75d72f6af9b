//! Process-level configuration for the service.

use super::constants::{APP_HOST, APP_PORT};
use super::pipeline::PipelineSettings;
use crate::errors::{Result, SensorError};
use crate::store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "SENSOR_";

/// Top-level configuration: HTTP binding, store location and pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Document store location.
    #[serde(default)]
    pub store: StoreConfig,
    /// Pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

fn default_host() -> String {
    APP_HOST.to_string()
}

fn default_port() -> u16 {
    APP_PORT
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            store: StoreConfig::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

impl AppConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the configuration from `SENSOR_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Config` if a variable cannot be parsed or the
    /// resulting settings are out of range.
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect();
        Self::from_vars(&vars)
    }

    /// Builds the configuration from an explicit variable map.
    ///
    /// Recognised keys: `SENSOR_HOST`, `SENSOR_PORT`, `SENSOR_STORE_URL`,
    /// `SENSOR_ARTIFACT_DIR`, `SENSOR_SAVED_MODEL_DIR`, `SENSOR_SCHEMA_FILE`,
    /// `SENSOR_DATABASE`, `SENSOR_COLLECTION`, `SENSOR_SPLIT_RATIO`,
    /// `SENSOR_RANDOM_SEED`, `SENSOR_DRIFT_THRESHOLD`.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Config` on unparseable or out-of-range values.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let get = |name: &str| vars.get(&format!("{ENV_PREFIX}{name}")).map(String::as_str);
        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.host = host.to_string();
        }
        if let Some(port) = get("PORT") {
            config.port = parse_var("PORT", port)?;
        }
        if let Some(url) = get("STORE_URL") {
            config.store = StoreConfig::new(url);
        }

        let pipeline = &mut config.pipeline;
        if let Some(dir) = get("ARTIFACT_DIR") {
            pipeline.artifact_root = PathBuf::from(dir);
        }
        if let Some(dir) = get("SAVED_MODEL_DIR") {
            pipeline.saved_model_dir = PathBuf::from(dir);
        }
        if let Some(path) = get("SCHEMA_FILE") {
            pipeline.schema_file_path = PathBuf::from(path);
        }
        if let Some(db) = get("DATABASE") {
            pipeline.database_name = db.to_string();
        }
        if let Some(collection) = get("COLLECTION") {
            pipeline.collection_name = collection.to_string();
        }
        if let Some(ratio) = get("SPLIT_RATIO") {
            pipeline.train_test_split_ratio = parse_var("SPLIT_RATIO", ratio)?;
        }
        if let Some(seed) = get("RANDOM_SEED") {
            pipeline.random_seed = Some(parse_var("RANDOM_SEED", seed)?);
        }
        if let Some(threshold) = get("DRIFT_THRESHOLD") {
            pipeline.drift_threshold = parse_var("DRIFT_THRESHOLD", threshold)?;
        }

        config.pipeline.validate()?;
        Ok(config)
    }

    /// Sets the bind address.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the bind port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Returns `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim().parse().map_err(|e| {
        SensorError::config_with_source(format!("invalid value for {ENV_PREFIX}{name}: '{raw}'"), e)
    })
}
