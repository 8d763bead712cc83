//! Client configuration
//!
//! Loaded with precedence, highest first:
//! 1. Environment variables (`LLAMADECK_*`)
//! 2. Project config file (.llamadeck/config.yaml)
//! 3. Global config file (~/.llamadeck/config.yaml)
//! 4. Built-in defaults

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{endpoint::Endpoint, error::ClientError, Result};

/// Connection settings for the model server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Raw host input: IP, hostname, `host:port` or URL (default: 127.0.0.1)
    pub host: String,
    /// Raw port input (default: 11434)
    pub port: String,
    /// Model used when none is selected (default: qwq)
    pub default_model: String,
    /// Timeout for request/response calls in seconds (default: 30)
    pub timeout_secs: u64,
    /// Connect timeout in seconds, also the only bound on streaming calls (default: 5)
    pub connect_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: "11434".to_string(),
            default_model: "qwq".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}

impl ClientConfig {
    /// Load configuration from files and environment, then validate
    pub fn load_with_precedence() -> Result<Self> {
        let mut config = Self::default();

        let global_config_path = Self::get_global_config_path();
        if global_config_path.exists() {
            debug!("Loading global config from {:?}", global_config_path);
            config.merge_from_file(&global_config_path)?;
        }

        let project_config_path = Self::get_project_config_path();
        if project_config_path.exists() {
            debug!("Loading project config from {:?}", project_config_path);
            config.merge_from_file(&project_config_path)?;
        }

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Global configuration path (~/.llamadeck/config.yaml)
    pub fn get_global_config_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".llamadeck/config.yaml")
    }

    /// Project configuration path (.llamadeck/config.yaml)
    pub fn get_project_config_path() -> PathBuf {
        PathBuf::from(".llamadeck/config.yaml")
    }

    /// Override fields from `LLAMADECK_*` environment variables
    pub fn load_from_env(&mut self) {
        if let Ok(host) = std::env::var("LLAMADECK_HOST") {
            debug!("Loading LLAMADECK_HOST from environment: {}", host);
            self.host = host;
        }

        if let Ok(port) = std::env::var("LLAMADECK_PORT") {
            debug!("Loading LLAMADECK_PORT from environment: {}", port);
            self.port = port;
        }

        if let Ok(model) = std::env::var("LLAMADECK_DEFAULT_MODEL") {
            debug!("Loading LLAMADECK_DEFAULT_MODEL from environment: {}", model);
            self.default_model = model;
        }

        if let Ok(timeout_str) = std::env::var("LLAMADECK_TIMEOUT_SECS") {
            match timeout_str.parse::<u64>() {
                Ok(timeout) => self.timeout_secs = timeout,
                Err(_) => warn!("Invalid LLAMADECK_TIMEOUT_SECS value: {}", timeout_str),
            }
        }

        if let Ok(timeout_str) = std::env::var("LLAMADECK_CONNECT_TIMEOUT_SECS") {
            match timeout_str.parse::<u64>() {
                Ok(timeout) => self.connect_timeout_secs = timeout,
                Err(_) => warn!(
                    "Invalid LLAMADECK_CONNECT_TIMEOUT_SECS value: {}",
                    timeout_str
                ),
            }
        }
    }

    /// Merge values present in a YAML file over the current ones
    pub fn merge_from_file(&mut self, path: &PathBuf) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let file_config: FileConfig = serde_yaml::from_str(&content).map_err(|e| {
            ClientError::ConfigError(format!("Failed to parse config file: {}", e))
        })?;

        if let Some(server) = file_config.server {
            if let Some(host) = server.host {
                self.host = host;
            }
            if let Some(port) = server.port {
                self.port = port.into_string();
            }
            if let Some(default_model) = server.default_model {
                self.default_model = default_model;
            }
            if let Some(timeout_secs) = server.timeout_secs {
                self.timeout_secs = timeout_secs;
            }
            if let Some(connect_timeout_secs) = server.connect_timeout_secs {
                self.connect_timeout_secs = connect_timeout_secs;
            }
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ClientError::ConfigError("Server host cannot be empty".to_string()));
        }

        let port = self.port.trim();
        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ClientError::ConfigError(format!(
                "Server port must be numeric: {:?}",
                self.port
            )));
        }

        if self.default_model.trim().is_empty() {
            return Err(ClientError::ConfigError(
                "Default model cannot be empty".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ClientError::ConfigError(
                "Timeout must be greater than 0 seconds".to_string(),
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(ClientError::ConfigError(
                "Connect timeout must be greater than 0 seconds".to_string(),
            ));
        }

        Ok(())
    }

    /// Endpoint resolved from the raw host and port
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::resolve(&self.host, &self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// YAML file structure
#[derive(Debug, Deserialize)]
struct FileConfig {
    server: Option<FileServerSettings>,
}

/// Server settings from YAML (all fields optional)
#[derive(Debug, Deserialize)]
struct FileServerSettings {
    host: Option<String>,
    port: Option<PortValue>,
    default_model: Option<String>,
    timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
}

/// `port: 11434` and `port: "11434"` are both accepted
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(u64),
    Text(String),
}

impl PortValue {
    fn into_string(self) -> String {
        match self {
            PortValue::Number(n) => n.to_string(),
            PortValue::Text(s) => s,
        }
    }
}
