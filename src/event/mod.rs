//! Events dispatched through the [`event_bus::EventBus`].

pub mod event_bus;

use crate::alert::Alert;

/// Marker trait for events that can be dispatched through the event bus.
pub trait Event: std::any::Any + Send + Sync + 'static {
    /// Get the name of the event type.
    fn event_name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Fired when an arrival alert should be shown inside the app.
#[derive(Clone, Debug)]
pub struct ArrivalAlertEvent {
    pub alert: Alert,
}

impl ArrivalAlertEvent {
    pub fn new(alert: Alert) -> Self {
        Self { alert }
    }

    pub fn message(&self) -> &str {
        &self.alert.body
    }
}

impl Event for ArrivalAlertEvent {}
