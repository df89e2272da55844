//! # Bridge configuration
//!
//! Built once at startup and passed to the HTTP and MQTT layers. Values are
//! layered: built-in defaults, then an optional TOML file, then environment
//! variables.
//!
//! The TOML file is read from `$LUFTDATEN2MQTT_CONFIG`, or from
//! `<config dir>/luftdaten2mqtt/config.toml` when that file exists.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::Level;

pub const CONFIG_PATH_VAR: &str = "LUFTDATEN2MQTT_CONFIG";
const CONFIG_DIR: &str = "luftdaten2mqtt";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub http_port: u16,
    pub mqtt_host: String,
    pub mqtt_port: u16,
    /// Prepended verbatim to device ids
    pub mqtt_topic: String,
    /// Without a user the broker is contacted anonymously
    pub mqtt_user: Option<String>,
    pub mqtt_pass: Option<String>,
    pub mqtt_client_id: String,
    pub discovery_prefix: String,
    pub log_level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            mqtt_host: "192.168.1.1".to_string(),
            mqtt_port: 1883,
            mqtt_topic: "luftdaten/".to_string(),
            mqtt_user: None,
            mqtt_pass: None,
            mqtt_client_id: "luftdaten2mqtt".to_string(),
            discovery_prefix: "homeassistant".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Loads the configuration from the process environment and, if
    /// present, the config file.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_file_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Overrides fields with the variables `lookup` knows about.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("HTTP_PORT") {
            self.http_port = parse_value("HTTP_PORT", &port)?;
        }
        if let Some(host) = lookup("MQTT_HOST") {
            self.mqtt_host = host;
        }
        if let Some(port) = lookup("MQTT_PORT") {
            self.mqtt_port = parse_value("MQTT_PORT", &port)?;
        }
        if let Some(topic) = lookup("MQTT_TOPIC") {
            self.mqtt_topic = topic;
        }
        if let Some(user) = lookup("MQTT_USER") {
            self.mqtt_user = Some(user).filter(|u| !u.is_empty());
        }
        if let Some(pass) = lookup("MQTT_PASS") {
            self.mqtt_pass = Some(pass).filter(|p| !p.is_empty());
        }
        if let Some(client_id) = lookup("MQTT_CLIENT_ID") {
            self.mqtt_client_id = client_id;
        }
        if let Some(prefix) = lookup("DISCOVERY_PREFIX") {
            self.discovery_prefix = prefix;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.level()?;
        if self.mqtt_host.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "MQTT_HOST",
                value: self.mqtt_host.clone(),
            });
        }
        if self.mqtt_client_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "MQTT_CLIENT_ID",
                value: self.mqtt_client_id.clone(),
            });
        }
        Ok(())
    }

    /// Maximum log level for the tracing subscriber.
    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidValue {
            key: "LOG_LEVEL",
            value: self.log_level.clone(),
        })
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        return Some(PathBuf::from(path));
    }
    let mut path = dirs::config_dir()?;
    path.push(CONFIG_DIR);
    path.push(CONFIG_FILE);
    path.exists().then_some(path)
}
