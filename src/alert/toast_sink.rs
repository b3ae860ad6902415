//! In-app toast channel.

use std::sync::Arc;

use async_trait::async_trait;

use crate::alert::Alert;
use crate::alert::AlertSink;
use crate::alert::error::DeliveryError;
use crate::event::ArrivalAlertEvent;
use crate::event::event_bus::EventBus;

/// Publishes alerts as [`ArrivalAlertEvent`]s for in-app listeners.
pub struct ToastAlertSink {
    event_bus: Arc<EventBus>,
}

impl ToastAlertSink {
    pub fn new(event_bus: Arc<EventBus>) -> Self {
        Self { event_bus }
    }
}

#[async_trait]
impl AlertSink for ToastAlertSink {
    async fn present(&self, alert: &Alert) -> Result<(), DeliveryError> {
        if !self.event_bus.has_subscribers::<ArrivalAlertEvent>() {
            return Err(DeliveryError::NoListeners);
        }
        self.event_bus.publish(ArrivalAlertEvent::new(alert.clone()));
        Ok(())
    }
}
