//! Waypoint publishing to an HTTP viewer.

use anyhow::{Context, Result};
use nav_core::Waypoint;
use nav_mission::WaypointSink;
use reqwest::Client;
use std::time::Duration;
use tokio::runtime::Handle;

const REQUEST_TIMEOUT_SECS: u64 = 5;

/// POSTs every planned route as a JSON array of waypoints.
///
/// Requests run on spawned tasks; failures are logged and dropped.
pub struct HttpWaypointSink {
    client: Client,
    url: String,
    runtime: Handle,
}

impl HttpWaypointSink {
    /// Must be called from within a tokio runtime.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let runtime = Handle::try_current().context("waypoint sink needs a tokio runtime")?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
            runtime,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl WaypointSink for HttpWaypointSink {
    fn publish(&mut self, waypoints: &[Waypoint]) -> Result<()> {
        let client = self.client.clone();
        let url = self.url.clone();
        let body = waypoints.to_vec();

        self.runtime.spawn(async move {
            match client.post(&url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(%url, count = body.len(), "waypoints published");
                }
                Ok(resp) => {
                    tracing::warn!(%url, status = %resp.status(), "waypoint viewer rejected route");
                }
                Err(err) => {
                    tracing::warn!(%url, error = %err, "failed to publish waypoints");
                }
            }
        });
        Ok(())
    }
}
