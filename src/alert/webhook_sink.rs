//! System notification channel backed by an HTTP webhook.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use log::info;
use wreq::Client;
use wreq::header::CONTENT_TYPE;
use wreq::header::HeaderMap;
use wreq::header::HeaderValue;
use wreq::header::USER_AGENT;

use crate::alert::Alert;
use crate::alert::AlertSink;
use crate::alert::error::DeliveryError;

/// Posts each alert as JSON to a fixed URL.
pub struct WebhookAlertSink {
    pub webhook_url: String,
    client: Client,
}

impl WebhookAlertSink {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("bus-notifier/0.1"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            webhook_url: webhook_url.into(),
            client,
        })
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn present(&self, alert: &Alert) -> Result<(), DeliveryError> {
        debug!("Attempting to execute webhook for alert: {}", alert.body);
        let payload = serde_json::to_string(alert)?;
        let response = self
            .client
            .post(self.webhook_url.as_str())
            .body(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
            });
        }
        info!("Successfully executed webhook for alert: {}", alert.body);
        Ok(())
    }
}
