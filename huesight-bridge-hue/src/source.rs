//! Bridge capabilities and the device snapshots they produce.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::HueError;

/// An established, authenticated bridge session.
///
/// Produced by the bootstrap and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSession {
    /// Bridge address: host, `host:port` or a full `http(s)://` URL.
    pub address: String,
    /// Credential token (the Hue API "username").
    pub username: String,
}

impl BridgeSession {
    pub fn new(address: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
        }
    }

    /// Base URL of the bridge.
    pub fn base_url(&self) -> String {
        base_url(&self.address)
    }
}

/// Build the base URL for a bridge address.
///
/// Addresses without a scheme are reached over plain HTTP, like the bridge's
/// local API.
pub fn base_url(address: &str) -> String {
    let address = address.trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

/// A bridge candidate returned by discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredBridge {
    pub id: String,
    pub address: String,
}

/// Point-in-time state of one light.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightSnapshot {
    pub id: String,
    pub name: String,
    pub is_on: bool,
    pub is_reachable: bool,
    pub device_type: String,
}

/// Point-in-time state of one sensor.
///
/// Capabilities a sensor does not report are `None`, which is distinct from
/// a reported `false` or zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    pub id: String,
    pub name: String,
    pub device_type: String,
    pub presence: Option<bool>,
    pub temperature: Option<f64>,
    pub light_level: Option<i64>,
}

/// Unauthenticated bridge operations used while bootstrapping a session.
#[async_trait]
pub trait BridgeDirectory: Send + Sync {
    /// List bridges on the local network.
    async fn discover(&self) -> Result<Vec<DiscoveredBridge>, HueError>;

    /// Request a new credential from the bridge at `address`.
    async fn pair(&self, address: &str, device_type: &str) -> Result<String, HueError>;

    /// Whether the session's credential is accepted by the bridge.
    async fn is_authenticated(&self, session: &BridgeSession) -> Result<bool, HueError>;
}

/// Read access to the devices behind an authenticated session.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch the state of every light.
    async fn list_lights(&self, session: &BridgeSession) -> Result<Vec<LightSnapshot>, HueError>;

    /// Fetch the state of every sensor.
    async fn list_sensors(&self, session: &BridgeSession)
    -> Result<Vec<SensorSnapshot>, HueError>;
}

#[async_trait]
impl<T: SnapshotSource + ?Sized> SnapshotSource for Arc<T> {
    async fn list_lights(&self, session: &BridgeSession) -> Result<Vec<LightSnapshot>, HueError> {
        (**self).list_lights(session).await
    }

    async fn list_sensors(
        &self,
        session: &BridgeSession,
    ) -> Result<Vec<SensorSnapshot>, HueError> {
        (**self).list_sensors(session).await
    }
}
