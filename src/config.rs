//! Broker connection settings.

use std::error::Error;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 1883;
const CLIENT_ID_PREFIX: &str = "smooth_client_";

/// Error type for loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(std::io::Error),
    /// The configuration was not valid JSON for [`EventConfig`].
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "invalid config: {}", e),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

/// Where and as whom to connect.
///
/// ```json
/// { "host": "broker.local", "port": 1883, "client_id": "orders-service" }
/// ```
///
/// Every field is optional; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub host: String,
    pub port: u16,
    /// Fixed client id. When absent a random one is generated per connect.
    pub client_id: Option<String>,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            client_id: None,
        }
    }
}

impl EventConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: None,
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::Parse)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json(&contents)
    }

    /// Resolve the options handed to [`Transport::connect`](crate::Transport::connect).
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            host: self.host.clone(),
            port: self.port,
            client_id: self.client_id.clone().unwrap_or_else(generate_client_id),
        }
    }
}

/// Concrete connection parameters for one transport connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub client_id: String,
}

impl ConnectOptions {
    /// Broker address in `tcp://host:port` form.
    pub fn address(&self) -> String {
        format!("tcp://{}:{}", self.host, self.port)
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        EventConfig::default().connect_options()
    }
}

fn generate_client_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}{}", CLIENT_ID_PREFIX, &id[..4])
}
