//! Hue bridge poller.
//!
//! Connects to a Hue bridge, pairing on first run, and polls its lights and
//! sensors into InfluxDB.

use anyhow::{Context, Result};
use huesight_bridge_hue::{HueBridgeConfig, HueClient, HuePoller, establish_session};
use huesight_common::{BridgeArgs, BridgeConfig};
use huesight_exporter_influx::InfluxWriter;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = BridgeArgs::parse_with_default("huesight.json5");

    // Load configuration
    let config = HueBridgeConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    // Initialize logging
    let log_config = config
        .logging
        .with_level_override(args.log_level.as_deref());
    huesight_common::init_tracing(&log_config)
        .map_err(|e| anyhow::anyhow!("Failed to init tracing: {}", e))?;

    info!("Starting huesight-bridge-hue");
    info!("Loaded configuration from {:?}", args.config);

    let client = HueClient::new(
        config.bridge.discovery_url.clone(),
        config.bridge.timeout(),
    )
    .context("Failed to build Hue client")?;

    let session = match establish_session(&client, &config.bridge).await {
        Ok(session) => session,
        Err(e) => {
            error!("Bridge setup failed: {} ({})", e, e.hint());
            return Err(e.into());
        }
    };

    let sink = match &config.influx {
        Some(influx) => {
            let writer = InfluxWriter::new(influx.clone())
                .context("Failed to build InfluxDB writer")?;
            match writer.ping().await {
                Ok(()) => info!(url = %influx.base_url(), db = %influx.database, "InfluxDB reachable"),
                Err(e) => warn!(url = %influx.base_url(), "InfluxDB ping failed: {}", e),
            }
            Some(writer)
        }
        None => {
            warn!("No influx section configured; metrics will not be persisted");
            None
        }
    };

    let poller = HuePoller::new(client, sink, session, config.poll.interval());
    info!(
        address = %poller.session().address,
        "Hue poller running, press Ctrl-C to stop"
    );

    // Poll until a shutdown signal arrives
    tokio::select! {
        _ = poller.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("Received shutdown signal");
        }
    }

    info!("Hue poller stopped");

    Ok(())
}
