//! Session bootstrap: discovery, pairing and authentication check.
//!
//! ```text
//! Unconfigured ──discover──> BridgeFound ──pair──> Paired ──auth check──> Ready
//!                                 │                  ^            │
//!                                 └─ username known ─┘            └──> Failed
//! ```
//!
//! Each step is skipped when the configuration already provides what it
//! would produce, so re-running with a complete configuration performs only
//! the authentication check. Nothing here retries: every failure is returned
//! to the caller, which must not start polling.

use thiserror::Error;
use tracing::{info, warn};

use crate::client::{HueError, LINK_BUTTON_NOT_PRESSED};
use crate::config::BridgeSettings;
use crate::source::{BridgeDirectory, BridgeSession};

/// Device identity announced to the bridge when pairing.
pub const DEVICE_TYPE: &str = "huesight#poller";

/// Fatal bootstrap errors.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("No bridges found")]
    NoBridgeFound,

    #[error("Bridge at {address} refused pairing: {reason}")]
    PairingRejected { address: String, reason: String },

    #[error("Bridge at {address} rejected the configured credential")]
    AuthenticationFailed { address: String },

    #[error("Bridge communication failed: {0}")]
    Transport(#[from] HueError),
}

impl BootstrapError {
    /// Operator-facing hint for resolving the failure.
    pub fn hint(&self) -> &'static str {
        match self {
            BootstrapError::NoBridgeFound => {
                "set bridge.address in the configuration or check the network"
            }
            BootstrapError::PairingRejected { .. } => {
                "press the link button on the bridge and start again"
            }
            BootstrapError::AuthenticationFailed { .. } => {
                "remove bridge.username from the configuration to pair again"
            }
            BootstrapError::Transport(_) => "check that the bridge is reachable",
        }
    }
}

/// Bootstrap progress.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Stage {
    Unconfigured,
    BridgeFound { address: String },
    Paired(BridgeSession),
}

impl Stage {
    fn initial(settings: &BridgeSettings) -> Self {
        match (&settings.address, &settings.username) {
            (None, _) => Stage::Unconfigured,
            (Some(address), None) => Stage::BridgeFound {
                address: address.clone(),
            },
            (Some(address), Some(username)) => {
                Stage::Paired(BridgeSession::new(address.clone(), username.clone()))
            }
        }
    }
}

/// Drives a [`BridgeDirectory`] from configuration to an authenticated session.
pub struct SessionBootstrap<'a, D: BridgeDirectory + ?Sized> {
    directory: &'a D,
}

impl<'a, D: BridgeDirectory + ?Sized> SessionBootstrap<'a, D> {
    pub fn new(directory: &'a D) -> Self {
        Self { directory }
    }

    /// Run the bootstrap to completion.
    pub async fn establish(
        &self,
        settings: &BridgeSettings,
    ) -> Result<BridgeSession, BootstrapError> {
        let mut stage = Stage::initial(settings);

        loop {
            stage = match stage {
                Stage::Unconfigured => Stage::BridgeFound {
                    address: self.discover().await?,
                },
                Stage::BridgeFound { address } => match &settings.username {
                    Some(username) => Stage::Paired(BridgeSession::new(address, username.clone())),
                    None => {
                        let username = self.pair(&address).await?;
                        Stage::Paired(BridgeSession::new(address, username))
                    }
                },
                Stage::Paired(session) => return self.authenticate(session).await,
            };
        }
    }

    async fn discover(&self) -> Result<String, BootstrapError> {
        info!("No bridge address configured, running discovery");

        let bridges = self.directory.discover().await?;
        for bridge in &bridges {
            info!(" + Found {} at {}", bridge.id, bridge.address);
        }

        let bridge = bridges.into_iter().next().ok_or(BootstrapError::NoBridgeFound)?;
        info!(id = %bridge.id, address = %bridge.address, "Using bridge");

        Ok(bridge.address)
    }

    async fn pair(&self, address: &str) -> Result<String, BootstrapError> {
        info!(address = %address, device_type = DEVICE_TYPE, "No username configured, pairing");

        match self.directory.pair(address, DEVICE_TYPE).await {
            Ok(username) => {
                warn!(
                    address = %address,
                    username = %username,
                    "Paired with bridge; add this username to the configuration to skip pairing next time"
                );
                Ok(username)
            }
            Err(HueError::Api {
                kind, description, ..
            }) => {
                if kind == LINK_BUTTON_NOT_PRESSED {
                    warn!("Link button not pressed on the bridge");
                }
                Err(BootstrapError::PairingRejected {
                    address: address.to_string(),
                    reason: description,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn authenticate(&self, session: BridgeSession) -> Result<BridgeSession, BootstrapError> {
        info!(address = %session.address, "Checking bridge auth");

        if self.directory.is_authenticated(&session).await? {
            info!(address = %session.address, "Bridge session ready");
            Ok(session)
        } else {
            Err(BootstrapError::AuthenticationFailed {
                address: session.address,
            })
        }
    }
}

/// Establish a session with `directory` using `settings`.
pub async fn establish_session<D: BridgeDirectory + ?Sized>(
    directory: &D,
    settings: &BridgeSettings,
) -> Result<BridgeSession, BootstrapError> {
    SessionBootstrap::new(directory).establish(settings).await
}
