//! Hue bridge poller.
//!
//! Establishes an authenticated session with a Hue bridge (discovering and
//! pairing when the configuration does not provide them), then polls the
//! bridge's lights and sensors on a fixed delay and writes one metric record
//! per device to an optional sink.
//!
//! # Records
//!
//! ```text
//! light,light=<name>   name="..",on=0|1i,reachable=0|1i,type=".."
//! sensor,sensor=<name> name="..",presence=0|1i,temperature=<f>,lightlevel=<n>i,type=".."
//! ```

pub mod bootstrap;
pub mod client;
pub mod config;
pub mod mapper;
pub mod poller;
pub mod source;

pub use bootstrap::{BootstrapError, DEVICE_TYPE, SessionBootstrap, establish_session};
pub use client::{HueClient, HueError};
pub use config::{BridgeSettings, HueBridgeConfig, PollSettings};
pub use poller::{HuePoller, IterationReport, PollerError};
pub use source::{
    BridgeDirectory, BridgeSession, DiscoveredBridge, LightSnapshot, SensorSnapshot,
    SnapshotSource,
};
