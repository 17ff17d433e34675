//! Configuration for the InfluxDB sink.

use huesight_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// InfluxDB 1.x HTTP endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfluxConfig {
    /// Hostname or IP address of the InfluxDB server.
    pub host: String,

    /// HTTP port (default: 8086).
    #[serde(default = "default_port")]
    pub port: u16,

    /// "http" or "https" (default: "http").
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Target database.
    pub database: String,

    /// Optional basic credentials.
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Per-request timeout in milliseconds (default: 5000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_port() -> u16 {
    8086
}

fn default_protocol() -> String {
    "http".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl InfluxConfig {
    /// Create a config for `host`/`database` with default port and protocol.
    pub fn new(host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            protocol: default_protocol(),
            database: database.into(),
            username: None,
            password: None,
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Base URL of the server, e.g. `http://localhost:8086`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::validation("influx.host cannot be empty"));
        }

        if self.database.trim().is_empty() {
            return Err(Error::validation("influx.database cannot be empty"));
        }

        match self.protocol.as_str() {
            "http" | "https" => {}
            other => {
                return Err(Error::Validation(format!(
                    "influx.protocol '{}' is not supported (use http or https)",
                    other
                )));
            }
        }

        if self.timeout_ms == 0 {
            return Err(Error::validation("influx.timeout_ms must be > 0"));
        }

        Ok(())
    }
}
