//! HTTP client for the Hue bridge REST API and the discovery service.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::source::{
    BridgeDirectory, BridgeSession, DiscoveredBridge, LightSnapshot, SensorSnapshot,
    SnapshotSource, base_url,
};

/// Errors talking to a bridge or the discovery service.
#[derive(Debug, thiserror::Error)]
pub enum HueError {
    /// A TCP-level connection could not be established or timed out.
    #[error("Connection failed to {url}: {detail}")]
    Connect { url: String, detail: String },

    /// The remote server replied with a non-2xx HTTP status code.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from {url}: {detail}")]
    Json { url: String, detail: String },

    /// The bridge answered with an API error object.
    #[error("Bridge error {kind} at '{address}': {description}")]
    Api {
        kind: u16,
        address: String,
        description: String,
    },
}

/// Hue API error type returned when the link button was not pressed.
pub const LINK_BUTTON_NOT_PRESSED: u16 = 101;

// --- Hue API wire types ---

#[derive(Debug, Deserialize)]
struct RawDiscoveredBridge {
    id: String,
    internalipaddress: String,
    #[serde(default)]
    port: Option<u16>,
}

/// One element of the array the bridge returns for writes and errors.
#[derive(Debug, Deserialize)]
struct ApiEntry {
    #[serde(default)]
    success: Option<Value>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "type")]
    kind: u16,
    #[serde(default)]
    address: String,
    #[serde(default)]
    description: String,
}

impl From<ApiErrorBody> for HueError {
    fn from(e: ApiErrorBody) -> Self {
        HueError::Api {
            kind: e.kind,
            address: e.address,
            description: e.description,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawLight {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    state: RawLightState,
}

#[derive(Debug, Default, Deserialize)]
struct RawLightState {
    #[serde(default)]
    on: Option<bool>,
    #[serde(default)]
    reachable: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct RawSensor {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    state: RawSensorState,
}

#[derive(Debug, Default, Deserialize)]
struct RawSensorState {
    #[serde(default)]
    presence: Option<bool>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    lightlevel: Option<i64>,
}

/// Client for the Hue bridge local API.
#[derive(Debug, Clone)]
pub struct HueClient {
    client: reqwest::Client,
    discovery_url: String,
}

impl HueClient {
    /// Create a client with the given discovery endpoint and per-request timeout.
    pub fn new(discovery_url: impl Into<String>, timeout: Duration) -> Result<Self, HueError> {
        let discovery_url = discovery_url.into();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HueError::Connect {
                url: discovery_url.clone(),
                detail: e.to_string(),
            })?;

        Ok(Self {
            client,
            discovery_url,
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, HueError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HueError::Connect {
                url: url.to_string(),
                detail: e.to_string(),
            })?;

        read_json(url, resp).await
    }

    /// Fetch a resource collection keyed by device id.
    async fn get_collection<T: DeserializeOwned>(
        &self,
        session: &BridgeSession,
        resource: &str,
    ) -> Result<Vec<(String, T)>, HueError> {
        let url = format!(
            "{}/api/{}/{}",
            session.base_url(),
            session.username,
            resource
        );
        let value = self.get_json(&url).await?;
        reject_api_error(&url, &value)?;

        let map: HashMap<String, T> = decode(&url, value)?;
        let mut items: Vec<(String, T)> = map.into_iter().collect();
        items.sort_by(|(a, _), (b, _)| id_order(a).cmp(&id_order(b)));

        debug!(url = %url, count = items.len(), "Fetched {}", resource);
        Ok(items)
    }
}

async fn read_json(url: &str, resp: reqwest::Response) -> Result<Value, HueError> {
    if !resp.status().is_success() {
        return Err(HueError::Http {
            status: resp.status().as_u16(),
            url: url.to_string(),
        });
    }

    let bytes = resp.bytes().await.map_err(|e| HueError::Connect {
        url: url.to_string(),
        detail: e.to_string(),
    })?;

    serde_json::from_slice(&bytes).map_err(|e| HueError::Json {
        url: url.to_string(),
        detail: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(url: &str, value: Value) -> Result<T, HueError> {
    serde_json::from_value(value).map_err(|e| HueError::Json {
        url: url.to_string(),
        detail: e.to_string(),
    })
}

/// Turn the bridge's `[{"error": {...}}]` reply into an error.
fn reject_api_error(url: &str, value: &Value) -> Result<(), HueError> {
    if !value.is_array() {
        return Ok(());
    }

    let entries: Vec<ApiEntry> = decode(url, value.clone())?;
    match entries.into_iter().find_map(|entry| entry.error) {
        Some(error) => Err(error.into()),
        None => Err(HueError::Json {
            url: url.to_string(),
            detail: "expected an object keyed by id, got an array".to_string(),
        }),
    }
}

/// Sort key that orders numeric ids numerically and everything else after.
fn id_order(id: &str) -> (u64, &str) {
    (id.parse().unwrap_or(u64::MAX), id)
}

/// Address a discovered bridge is reached at.
fn discovered_address(raw: &RawDiscoveredBridge) -> String {
    match raw.port {
        Some(port) if port != 80 && port != 443 => {
            format!("{}:{}", raw.internalipaddress, port)
        }
        _ => raw.internalipaddress.clone(),
    }
}

fn light_snapshot(id: String, raw: RawLight) -> LightSnapshot {
    LightSnapshot {
        id,
        name: raw.name,
        is_on: raw.state.on.unwrap_or(false),
        is_reachable: raw.state.reachable.unwrap_or(false),
        device_type: raw.kind,
    }
}

fn sensor_snapshot(id: String, raw: RawSensor) -> SensorSnapshot {
    SensorSnapshot {
        id,
        name: raw.name,
        device_type: raw.kind,
        presence: raw.state.presence,
        temperature: raw.state.temperature,
        light_level: raw.state.lightlevel,
    }
}

#[async_trait]
impl BridgeDirectory for HueClient {
    async fn discover(&self) -> Result<Vec<DiscoveredBridge>, HueError> {
        let value = self.get_json(&self.discovery_url).await?;
        let raw: Vec<RawDiscoveredBridge> = decode(&self.discovery_url, value)?;

        Ok(raw
            .iter()
            .map(|bridge| DiscoveredBridge {
                id: bridge.id.clone(),
                address: discovered_address(bridge),
            })
            .collect())
    }

    async fn pair(&self, address: &str, device_type: &str) -> Result<String, HueError> {
        let url = format!("{}/api", base_url(address));
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "devicetype": device_type }))
            .send()
            .await
            .map_err(|e| HueError::Connect {
                url: url.clone(),
                detail: e.to_string(),
            })?;

        let value = read_json(&url, resp).await?;
        let entries: Vec<ApiEntry> = decode(&url, value)?;

        for entry in entries {
            if let Some(error) = entry.error {
                return Err(error.into());
            }
            if let Some(username) = entry
                .success
                .as_ref()
                .and_then(|s| s.get("username"))
                .and_then(Value::as_str)
            {
                return Ok(username.to_string());
            }
        }

        Err(HueError::Json {
            url,
            detail: "pairing response carried no username".to_string(),
        })
    }

    async fn is_authenticated(&self, session: &BridgeSession) -> Result<bool, HueError> {
        let url = format!("{}/api/{}/config", session.base_url(), session.username);
        let value = self.get_json(&url).await?;

        // Unknown users get either an error array or the public subset of the
        // config, which never includes the whitelist.
        Ok(value
            .as_object()
            .is_some_and(|config| config.contains_key("whitelist")))
    }
}

#[async_trait]
impl SnapshotSource for HueClient {
    async fn list_lights(&self, session: &BridgeSession) -> Result<Vec<LightSnapshot>, HueError> {
        let items = self.get_collection::<RawLight>(session, "lights").await?;
        Ok(items
            .into_iter()
            .map(|(id, raw)| light_snapshot(id, raw))
            .collect())
    }

    async fn list_sensors(
        &self,
        session: &BridgeSession,
    ) -> Result<Vec<SensorSnapshot>, HueError> {
        let items = self.get_collection::<RawSensor>(session, "sensors").await?;
        Ok(items
            .into_iter()
            .map(|(id, raw)| sensor_snapshot(id, raw))
            .collect())
    }
}
