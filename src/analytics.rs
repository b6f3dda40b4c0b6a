//! Usage-tracking collaborators.
//!
//! Tracking is entirely optional: the null object is the default and the
//! application behaves identically with it. The HTTP implementation fires
//! events in the background and never blocks or fails its caller.

use crate::core::Analytics;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Null-object analytics: tracking disabled.
pub struct NoopAnalytics;

impl Analytics for NoopAnalytics {
    fn track(&self, _event: &str, _properties: Value) {}
}

/// Sends tracking events as JSON to a configured endpoint, fire-and-forget.
pub struct HttpAnalytics {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpAnalytics {
    pub fn new(endpoint: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { endpoint, client })
    }
}

impl Analytics for HttpAnalytics {
    fn track(&self, event: &str, properties: Value) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let body = json!({ "event": event, "properties": properties });
        // A lost tracking event is not worth surfacing to the user.
        tokio::spawn(async move {
            match client.post(&endpoint).json(&body).send().await {
                Ok(response) if response.status().is_success() => {}
                Ok(response) => {
                    debug!(status = %response.status(), "Analytics endpoint rejected event");
                }
                Err(e) => {
                    debug!(error = %e, "Failed to send analytics event");
                }
            }
        });
    }
}
