//! Configuration for the bridge host
//!
//! Defaults can be overridden from the environment
//! (`EXTBRIDGE_<SECTION>_<KEY>`) or loaded from a TOML file.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

mod error;

pub use error::ConfigError;

use crate::logging::LogLevel;
use crate::replication::DEFAULT_SHARED_PROFILES_KEY;
use crate::store::DEFAULT_STORAGE_KEY;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bridge: BridgeConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub replication: ReplicationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Context-facing runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Identifier reported to message listeners as the sender id
    pub runtime_id: String,

    /// Area name attached to every storage change broadcast
    pub area_name: String,

    /// Page the UI context returns to when a sub-page closes itself
    pub home_page: String,

    /// Page opened by `open_options_page`
    pub options_page: String,
}

/// Persistent store locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Per-app settings directory holding the primary store
    pub data_dir: PathBuf,

    /// Cross-app shared directory holding the metadata replica and credentials
    pub shared_dir: PathBuf,

    /// Settings key under which the primary store blob lives
    pub storage_key: String,

    /// Shared settings key under which the profile metadata array lives
    pub shared_profiles_key: String,
}

/// Profile replication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationConfig {
    pub enabled: bool,

    /// Encrypts credential files at rest when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_passphrase: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    pub json_format: bool,

    pub with_timestamp: bool,

    pub with_target: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            runtime_id: "extbridge".to_string(),
            area_name: "local".to_string(),
            home_page: "sidepanel.html".to_string(),
            options_page: "full_settings.html".to_string(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            shared_dir: PathBuf::from("./shared"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            shared_profiles_key: DEFAULT_SHARED_PROFILES_KEY.to_string(),
        }
    }
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            credential_passphrase: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables on top of the defaults
    ///
    /// Example: `EXTBRIDGE_STORE_DATA_DIR=/var/lib/extbridge`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `EXTBRIDGE_*` overrides to an already loaded configuration
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(id) = env::var("EXTBRIDGE_BRIDGE_RUNTIME_ID") {
            self.bridge.runtime_id = id;
        }
        if let Ok(area) = env::var("EXTBRIDGE_BRIDGE_AREA_NAME") {
            self.bridge.area_name = area;
        }

        if let Ok(dir) = env::var("EXTBRIDGE_STORE_DATA_DIR") {
            self.store.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = env::var("EXTBRIDGE_STORE_SHARED_DIR") {
            self.store.shared_dir = PathBuf::from(dir);
        }
        if let Ok(key) = env::var("EXTBRIDGE_STORE_STORAGE_KEY") {
            self.store.storage_key = key;
        }

        if let Ok(enabled) = env::var("EXTBRIDGE_REPLICATION_ENABLED") {
            self.replication.enabled = enabled.parse().map_err(|e: std::str::ParseBoolError| {
                ConfigError::InvalidEnv {
                    var: "EXTBRIDGE_REPLICATION_ENABLED",
                    reason: e.to_string(),
                }
            })?;
        }
        if let Ok(passphrase) = env::var("EXTBRIDGE_REPLICATION_CREDENTIAL_PASSPHRASE") {
            self.replication.credential_passphrase = Some(passphrase);
        }

        if let Ok(level) = env::var("EXTBRIDGE_LOGGING_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = env::var("EXTBRIDGE_LOGGING_JSON_FORMAT") {
            self.logging.json_format = json.parse().map_err(|e: std::str::ParseBoolError| {
                ConfigError::InvalidEnv {
                    var: "EXTBRIDGE_LOGGING_JSON_FORMAT",
                    reason: e.to_string(),
                }
            })?;
        }

        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge.area_name.is_empty() {
            return Err(ConfigError::Invalid(
                "area_name must not be empty".to_string(),
            ));
        }

        if self.store.storage_key.is_empty() || self.store.shared_profiles_key.is_empty() {
            return Err(ConfigError::Invalid(
                "store keys must not be empty".to_string(),
            ));
        }

        if self.replication.enabled && self.store.shared_dir == self.store.data_dir {
            return Err(ConfigError::Invalid(
                "shared_dir must differ from data_dir when replication is enabled".to_string(),
            ));
        }

        if matches!(&self.replication.credential_passphrase, Some(p) if p.is_empty()) {
            return Err(ConfigError::Invalid(
                "credential_passphrase must not be empty when set".to_string(),
            ));
        }

        if LogLevel::parse(&self.logging.level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)?;

        std::fs::write(path, contents).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(())
    }
}
