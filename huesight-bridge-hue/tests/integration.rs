//! Integration tests for the Hue poller.
//!
//! These tests run the real HTTP client against an in-process server that
//! mimics the discovery service, the bridge's local API and an InfluxDB
//! `/write` endpoint.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use huesight_bridge_hue::{
    BootstrapError, BridgeDirectory, BridgeSession, BridgeSettings, DEVICE_TYPE, HueClient,
    HueError, HuePoller, PollerError, SnapshotSource, establish_session,
};
use huesight_exporter_influx::{InfluxConfig, InfluxWriter};
use serde_json::{Value, json};

const VALID_USER: &str = "k8sJ2mQ0-fake";

#[derive(Clone)]
struct FakeBridge {
    port: u16,
    link_pressed: bool,
    bridges_online: bool,
    pair_requests: Arc<Mutex<Vec<Value>>>,
    writes: Arc<Mutex<Vec<String>>>,
}

fn unauthorized(resource: &str) -> Json<Value> {
    Json(json!([{
        "error": { "type": 1, "address": format!("/{}", resource), "description": "unauthorized user" }
    }]))
}

async fn discovery_handler(State(state): State<FakeBridge>) -> Json<Value> {
    if state.bridges_online {
        Json(json!([
            { "id": "001788fffe0a1b2c", "internalipaddress": "127.0.0.1", "port": state.port },
            { "id": "001788fffe0d3e4f", "internalipaddress": "127.0.0.2", "port": state.port }
        ]))
    } else {
        Json(json!([]))
    }
}

async fn pair_handler(State(state): State<FakeBridge>, Json(body): Json<Value>) -> Json<Value> {
    state.pair_requests.lock().unwrap().push(body);

    if state.link_pressed {
        Json(json!([{ "success": { "username": VALID_USER } }]))
    } else {
        Json(json!([{
            "error": { "type": 101, "address": "", "description": "link button not pressed" }
        }]))
    }
}

async fn config_handler(Path(user): Path<String>) -> Json<Value> {
    if user == VALID_USER {
        Json(json!({
            "name": "Fake bridge",
            "swversion": "1967054020",
            "whitelist": { VALID_USER: { "name": DEVICE_TYPE } }
        }))
    } else {
        // Unknown users only see the public subset.
        Json(json!({ "name": "Fake bridge", "swversion": "1967054020" }))
    }
}

async fn lights_handler(Path(user): Path<String>) -> Json<Value> {
    if user != VALID_USER {
        return unauthorized("lights");
    }
    Json(json!({
        "2": {
            "name": "Desk",
            "type": "Dimmable light",
            "state": { "on": false, "bri": 1, "reachable": false }
        },
        "1": {
            "name": "Kitchen",
            "type": "Extended color light",
            "state": { "on": true, "bri": 254, "reachable": true }
        }
    }))
}

async fn sensors_handler(Path(user): Path<String>) -> Json<Value> {
    if user != VALID_USER {
        return unauthorized("sensors");
    }
    Json(json!({
        "4": {
            "name": "Hall",
            "type": "ZLLPresence",
            "state": { "presence": true, "lastupdated": "2024-01-01T00:00:00" }
        },
        "5": {
            "name": "Hall temperature",
            "type": "ZLLTemperature",
            "state": { "temperature": 2150, "lastupdated": "2024-01-01T00:00:00" }
        },
        "6": {
            "name": "Hall light level",
            "type": "ZLLLightLevel",
            "state": { "lightlevel": 42, "dark": true, "daylight": false }
        }
    }))
}

async fn write_handler(State(state): State<FakeBridge>, body: String) -> StatusCode {
    state.writes.lock().unwrap().push(body);
    StatusCode::NO_CONTENT
}

struct Harness {
    addr: SocketAddr,
    state: FakeBridge,
}

impl Harness {
    fn client(&self) -> HueClient {
        HueClient::new(
            format!("http://{}/discovery", self.addr),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    fn pair_requests(&self) -> Vec<Value> {
        self.state.pair_requests.lock().unwrap().clone()
    }

    fn writes(&self) -> Vec<String> {
        self.state.writes.lock().unwrap().clone()
    }

    fn address(&self) -> String {
        self.addr.to_string()
    }
}

/// Start a fake bridge; `link_pressed` decides how pairing is answered.
async fn start_fake_bridge(link_pressed: bool, bridges_online: bool) -> Harness {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = FakeBridge {
        port: addr.port(),
        link_pressed,
        bridges_online,
        pair_requests: Arc::new(Mutex::new(Vec::new())),
        writes: Arc::new(Mutex::new(Vec::new())),
    };

    let app = Router::new()
        .route("/discovery", get(discovery_handler))
        .route("/api", post(pair_handler))
        .route("/api/:user/config", get(config_handler))
        .route("/api/:user/lights", get(lights_handler))
        .route("/api/:user/sensors", get(sensors_handler))
        .route("/write", post(write_handler))
        .with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Harness { addr, state }
}

#[tokio::test]
async fn test_bootstrap_from_empty_config() {
    let harness = start_fake_bridge(true, true).await;
    let client = harness.client();

    let session = establish_session(&client, &BridgeSettings::default())
        .await
        .unwrap();

    // The first discovered candidate is used.
    assert_eq!(session, BridgeSession::new(harness.address(), VALID_USER));

    let requests = harness.pair_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["devicetype"], DEVICE_TYPE);
}

#[tokio::test]
async fn test_bootstrap_with_full_config_skips_pairing() {
    let harness = start_fake_bridge(false, true).await;
    let client = harness.client();
    let settings = BridgeSettings::configured(harness.address(), VALID_USER);

    let session = establish_session(&client, &settings).await.unwrap();

    assert_eq!(session.username, VALID_USER);
    assert!(harness.pair_requests().is_empty());
}

#[tokio::test]
async fn test_bootstrap_link_button_not_pressed() {
    let harness = start_fake_bridge(false, true).await;
    let client = harness.client();
    let settings = BridgeSettings {
        address: Some(harness.address()),
        ..BridgeSettings::default()
    };

    let err = establish_session(&client, &settings).await.unwrap_err();

    match err {
        BootstrapError::PairingRejected { reason, .. } => {
            assert_eq!(reason, "link button not pressed");
        }
        other => panic!("expected PairingRejected, got {other:?}"),
    }
    assert_eq!(harness.pair_requests().len(), 1);
}

#[tokio::test]
async fn test_bootstrap_no_bridges() {
    let harness = start_fake_bridge(true, false).await;
    let client = harness.client();

    let err = establish_session(&client, &BridgeSettings::default())
        .await
        .unwrap_err();

    assert!(matches!(err, BootstrapError::NoBridgeFound));
    assert!(harness.pair_requests().is_empty());
}

#[tokio::test]
async fn test_bootstrap_unknown_user() {
    let harness = start_fake_bridge(true, true).await;
    let client = harness.client();
    let settings = BridgeSettings::configured(harness.address(), "revoked");

    let err = establish_session(&client, &settings).await.unwrap_err();

    assert!(matches!(err, BootstrapError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn test_is_authenticated() {
    let harness = start_fake_bridge(true, true).await;
    let client = harness.client();

    let good = BridgeSession::new(harness.address(), VALID_USER);
    let bad = BridgeSession::new(harness.address(), "nobody");

    assert!(client.is_authenticated(&good).await.unwrap());
    assert!(!client.is_authenticated(&bad).await.unwrap());
}

#[tokio::test]
async fn test_list_lights_and_sensors() {
    let harness = start_fake_bridge(true, true).await;
    let client = harness.client();
    let session = BridgeSession::new(harness.address(), VALID_USER);

    let lights = client.list_lights(&session).await.unwrap();
    assert_eq!(lights.len(), 2);
    assert_eq!(lights[0].id, "1");
    assert_eq!(lights[0].name, "Kitchen");
    assert!(lights[0].is_on);
    assert!(lights[0].is_reachable);
    assert_eq!(lights[1].name, "Desk");
    assert!(!lights[1].is_on);

    let sensors = client.list_sensors(&session).await.unwrap();
    assert_eq!(sensors.len(), 3);

    let hall = &sensors[0];
    assert_eq!(hall.name, "Hall");
    assert_eq!(hall.presence, Some(true));
    assert_eq!(hall.temperature, None);
    assert_eq!(hall.light_level, None);

    assert_eq!(sensors[1].temperature, Some(2150.0));
    assert_eq!(sensors[2].light_level, Some(42));
}

#[tokio::test]
async fn test_list_lights_unauthorized() {
    let harness = start_fake_bridge(true, true).await;
    let client = harness.client();
    let session = BridgeSession::new(harness.address(), "nobody");

    let err = client.list_lights(&session).await.unwrap_err();

    assert!(matches!(err, HueError::Api { kind: 1, .. }));
}

#[tokio::test]
async fn test_unreachable_bridge() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HueClient::new("http://127.0.0.1:1/discovery", Duration::from_secs(1)).unwrap();
    let session = BridgeSession::new(addr.to_string(), VALID_USER);

    let err = client.list_sensors(&session).await.unwrap_err();
    assert!(matches!(err, HueError::Connect { .. }));
}

#[tokio::test]
async fn test_poll_once_into_influx() {
    let harness = start_fake_bridge(true, true).await;
    let client = harness.client();
    let session = BridgeSession::new(harness.address(), VALID_USER);

    let mut influx = InfluxConfig::new(harness.addr.ip().to_string(), "hue");
    influx.port = harness.addr.port();
    let writer = InfluxWriter::new(influx).unwrap();

    let poller = HuePoller::new(client, Some(writer), session, Duration::from_secs(1));
    let report = poller.poll_once().await;

    assert!(report.is_success());
    assert_eq!(report.lights.unwrap(), 2);
    assert_eq!(report.sensors.unwrap(), 3);

    // One write request per device.
    let writes = harness.writes();
    assert_eq!(writes.len(), 5);
    assert!(writes.iter().all(|body| body.lines().count() == 1));

    let kitchen = writes
        .iter()
        .find(|body| body.starts_with("light,light=Kitchen "))
        .expect("kitchen light written");
    assert!(kitchen.contains("on=1i"));
    assert!(kitchen.contains("reachable=1i"));
    assert!(kitchen.contains(r#"type="Extended color light""#));

    let hall = writes
        .iter()
        .find(|body| body.starts_with("sensor,sensor=Hall "))
        .expect("hall sensor written");
    assert!(hall.contains("presence=1i"));
    assert!(hall.contains("temperature=0"));
    assert!(hall.contains("lightlevel=0i"));

    let temperature = writes
        .iter()
        .find(|body| body.starts_with(r"sensor,sensor=Hall\ temperature "))
        .expect("temperature sensor written");
    assert!(temperature.contains("temperature=2150"));
}

#[tokio::test]
async fn test_poll_once_with_revoked_user() {
    let harness = start_fake_bridge(true, true).await;
    let session = BridgeSession::new(harness.address(), "revoked");

    let poller = HuePoller::<_, InfluxWriter>::new(
        harness.client(),
        None,
        session,
        Duration::from_secs(1),
    );
    let report = poller.poll_once().await;

    assert!(!report.is_success());
    assert!(matches!(report.lights, Err(PollerError::Fetch(HueError::Api { .. }))));
    assert!(matches!(report.sensors, Err(PollerError::Fetch(HueError::Api { .. }))));
}
