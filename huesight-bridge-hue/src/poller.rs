//! Bridge polling and metric publishing.

use std::collections::HashSet;
use std::time::Duration;

use huesight_common::{Measurement, MetricRecord, MetricSink, SinkError};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::client::HueError;
use crate::mapper::{map_light, map_sensor};
use crate::source::{BridgeSession, SnapshotSource};

/// Consecutive failed iterations after which failures log at `error`.
pub const ESCALATE_AFTER: u32 = 5;

/// Error type for polling operations.
#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] HueError),
    #[error("Write failed: {0}")]
    Write(#[from] SinkError),
}

/// Outcome of one poll iteration.
///
/// Each branch reports how many devices it fetched and wrote, or the first
/// error that stopped it.
#[derive(Debug)]
pub struct IterationReport {
    pub lights: Result<usize, PollerError>,
    pub sensors: Result<usize, PollerError>,
    pub elapsed: Duration,
}

impl IterationReport {
    pub fn is_success(&self) -> bool {
        self.lights.is_ok() && self.sensors.is_ok()
    }

    /// Failed branches, by name.
    pub fn failures(&self) -> Vec<(&'static str, &PollerError)> {
        [("lights", &self.lights), ("sensors", &self.sensors)]
            .into_iter()
            .filter_map(|(branch, result)| result.as_ref().err().map(|e| (branch, e)))
            .collect()
    }
}

/// Polls one bridge session on a fixed delay and writes the mapped records.
pub struct HuePoller<S, K> {
    source: S,
    sink: Option<K>,
    session: BridgeSession,
    interval: Duration,
}

impl<S: SnapshotSource, K: MetricSink> HuePoller<S, K> {
    /// Create a new poller. Without a sink, snapshots are fetched and mapped
    /// but nothing is persisted.
    pub fn new(source: S, sink: Option<K>, session: BridgeSession, interval: Duration) -> Self {
        Self {
            source,
            sink,
            session,
            interval,
        }
    }

    pub fn session(&self) -> &BridgeSession {
        &self.session
    }

    /// Run the polling loop.
    ///
    /// Never returns; iteration failures are logged and the next iteration
    /// starts `interval` after the previous one finished.
    pub async fn run(&self) {
        info!(
            address = %self.session.address,
            interval_ms = self.interval.as_millis() as u64,
            persisting = self.sink.is_some(),
            "Starting Hue poller"
        );

        let mut consecutive_failures: u32 = 0;

        loop {
            let report = self.poll_once().await;

            if report.is_success() {
                if consecutive_failures > 0 {
                    info!(
                        failed_iterations = consecutive_failures,
                        "Polling recovered"
                    );
                }
                consecutive_failures = 0;
            } else {
                consecutive_failures = consecutive_failures.saturating_add(1);
                for (branch, e) in report.failures() {
                    if consecutive_failures >= ESCALATE_AFTER {
                        error!(
                            branch,
                            consecutive_failures, "Polling keeps failing: {}", e
                        );
                    } else {
                        warn!(branch, consecutive_failures, "Polling error: {}", e);
                    }
                }
            }

            tokio::time::sleep(self.interval).await;
        }
    }

    /// Perform a single poll cycle.
    ///
    /// Lights and sensors are fetched concurrently; a failure in one branch
    /// does not affect the other.
    pub async fn poll_once(&self) -> IterationReport {
        let started = Instant::now();
        info!(
            local_time = %chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            "Polling bridge"
        );

        let (lights, sensors) = tokio::join!(self.poll_lights(), self.poll_sensors());

        let report = IterationReport {
            lights,
            sensors,
            elapsed: started.elapsed(),
        };

        if report.is_success() {
            info!(
                lights = report.lights.as_ref().copied().unwrap_or_default(),
                sensors = report.sensors.as_ref().copied().unwrap_or_default(),
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Poll complete"
            );
        }

        report
    }

    async fn poll_lights(&self) -> Result<usize, PollerError> {
        let lights = self.source.list_lights(&self.session).await?;
        warn_duplicate_names(Measurement::Light, lights.iter().map(|l| l.name.as_str()));

        for light in &lights {
            debug!(?light, "Light snapshot");
            self.write(map_light(light)).await?;
        }

        Ok(lights.len())
    }

    async fn poll_sensors(&self) -> Result<usize, PollerError> {
        let sensors = self.source.list_sensors(&self.session).await?;
        warn_duplicate_names(Measurement::Sensor, sensors.iter().map(|s| s.name.as_str()));

        for sensor in &sensors {
            debug!(?sensor, "Sensor snapshot");
            self.write(map_sensor(sensor)).await?;
        }

        Ok(sensors.len())
    }

    async fn write(&self, record: MetricRecord) -> Result<(), PollerError> {
        if let Some(sink) = &self.sink {
            sink.write_batch(std::slice::from_ref(&record)).await?;
            debug!(measurement = %record.measurement, tags = ?record.tags, "Wrote record");
        }
        Ok(())
    }
}

/// Devices sharing a name overwrite each other in the sink.
fn warn_duplicate_names<'a>(measurement: Measurement, names: impl Iterator<Item = &'a str>) {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            warn!(
                measurement = %measurement,
                name,
                "Duplicate device name; only the last record per timestamp is kept"
            );
        }
    }
}
