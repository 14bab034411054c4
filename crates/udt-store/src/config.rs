use serde::{Deserialize, Serialize};
use serde_json::Value;
use udt_types::{JsonMap, DEFAULT_DATASET_NAME};

use crate::error::{StoreError, StoreResult};

/// Configuration for a dataset store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name given to a fresh document and to imports that carry no name.
    pub default_name: String,
    /// Prefix of generated sample ids.
    pub id_prefix: String,
    /// Number of random base-36 characters after the prefix.
    pub id_length: usize,
    /// Capacity of each broadcast subscription channel.
    pub channel_capacity: usize,
    /// When `false`, every mutation fails with `NotWritable`.
    pub writable: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_DATASET_NAME.to_string(),
            id_prefix: "s".to_string(),
            id_length: 8,
            channel_capacity: 256,
            writable: true,
        }
    }
}

impl StoreConfig {
    /// A configuration whose store rejects all mutations.
    pub fn read_only() -> Self {
        Self {
            writable: false,
            ..Default::default()
        }
    }

    /// Parse and validate a TOML configuration. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.id_length == 0 {
            return Err(StoreError::Config("id_length must be at least 1".into()));
        }
        if self.channel_capacity == 0 {
            return Err(StoreError::Config("channel_capacity must be at least 1".into()));
        }
        Ok(())
    }
}

/// Host application configuration, delivered whenever it changes.
///
/// Opaque to the in-memory store. Networked backends read credentials and
/// endpoints from it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppConfig(JsonMap);

impl AppConfig {
    pub fn new(values: JsonMap) -> Self {
        Self(values)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &JsonMap {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<JsonMap> for AppConfig {
    fn from(values: JsonMap) -> Self {
        Self(values)
    }
}
