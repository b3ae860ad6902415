//! Delivery channels for arrival alerts.

pub mod error;
pub mod fanout_sink;
pub mod permission;
pub mod toast_sink;
pub mod webhook_sink;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::alert::error::DeliveryError;

pub const ALERT_TITLE: &str = "Bus arrival alert";
pub const ALERT_TAG: &str = "bus-arrival";

/// A message telling the user their bus is about to arrive.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    /// Channels that support it replace older alerts with the same tag.
    pub tag: String,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            title: ALERT_TITLE.to_string(),
            body: body.into(),
            tag: ALERT_TAG.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Presents alerts to the user.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn present(&self, alert: &Alert) -> Result<(), DeliveryError>;
}
