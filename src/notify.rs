//! Notifier implementations: the terminal notifier used by default and an
//! HTTP webhook notifier for forwarding alerts elsewhere.

use crate::core::{Alert, Notifier};
use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{error, info};

/// Prints each alert to the terminal. The whisper message is written to
/// stdout so it can be copied straight into the game client.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, alert: &Alert) -> Result<()> {
        println!(
            "[{}] {} <{}>",
            alert.search_name, alert.message, alert.category
        );
        Ok(())
    }
}

/// POSTs each alert as JSON to a configured webhook.
pub struct WebhookNotifier {
    webhook_url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            webhook_url,
            client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, alert: &Alert) -> Result<()> {
        let payload = json!({
            "text": format!("[{}] {}", alert.search_name, alert.message),
            "alert": alert,
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            info!(search = %alert.search_name, "Alert delivered to webhook");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                body = %body,
                "Webhook rejected the notification"
            );
            bail!("Webhook rejected the notification: status {status}, body: {body}");
        }
    }
}

#[cfg(test)]
mod webhook_tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_alert() -> Alert {
        Alert::new("cheap-tabula", "@Seller hi", "listing")
    }

    #[tokio::test]
    async fn test_webhook_notifier_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(format!("{}/hook", server.uri())).unwrap();
        assert!(notifier.notify(&test_alert()).await.is_ok());
    }

    #[tokio::test]
    async fn test_webhook_notifier_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(format!("{}/hook", server.uri())).unwrap();
        assert!(notifier.notify(&test_alert()).await.is_err());
    }
}
