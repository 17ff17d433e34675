//! Configuration for the Hue bridge poller.

use std::time::Duration;

use huesight_common::{BridgeConfig, Error, LoggingConfig, Result};
use huesight_exporter_influx::InfluxConfig;
use serde::{Deserialize, Serialize};

/// Complete poller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HueBridgeConfig {
    /// Bridge connection settings
    #[serde(default)]
    pub bridge: BridgeSettings,

    /// InfluxDB sink; metrics are only persisted when present
    #[serde(default)]
    pub influx: Option<InfluxConfig>,

    /// Poll loop settings
    #[serde(default)]
    pub poll: PollSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the bridge is and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSettings {
    /// Bridge address; discovered when absent
    #[serde(default)]
    pub address: Option<String>,

    /// Credential token; a new one is paired when absent
    #[serde(default)]
    pub username: Option<String>,

    /// Discovery service endpoint
    #[serde(default = "default_discovery_url")]
    pub discovery_url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_discovery_url() -> String {
    "https://discovery.meethue.com/".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            address: None,
            username: None,
            discovery_url: default_discovery_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl BridgeSettings {
    /// Settings for a bridge whose address and credential are both known.
    pub fn configured(address: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            username: Some(username.into()),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Poll loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    /// Delay between the end of one iteration and the start of the next
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    1000
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl BridgeConfig for HueBridgeConfig {
    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn validate(&self) -> Result<()> {
        if self.poll.interval_ms == 0 {
            return Err(Error::validation("poll.interval_ms must be > 0"));
        }

        if self.bridge.timeout_ms == 0 {
            return Err(Error::validation("bridge.timeout_ms must be > 0"));
        }

        if let Some(address) = &self.bridge.address
            && address.trim().is_empty()
        {
            return Err(Error::validation("bridge.address cannot be empty"));
        }

        if let Some(username) = &self.bridge.username
            && username.trim().is_empty()
        {
            return Err(Error::validation("bridge.username cannot be empty"));
        }

        if self.bridge.address.is_none() && self.bridge.discovery_url.trim().is_empty() {
            return Err(Error::validation(
                "bridge.discovery_url is required when bridge.address is not set",
            ));
        }

        if let Some(influx) = &self.influx {
            influx.validate()?;
        }

        Ok(())
    }
}
