//! Common test utilities and mock implementations.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use bus_notifier::alert::Alert;
use bus_notifier::alert::AlertSink;
use bus_notifier::alert::error::DeliveryError;
use bus_notifier::arrival::ArrivalSource;
use bus_notifier::arrival::error::ArrivalError;
use bus_notifier::model::ArrivalPrediction;
use bus_notifier::model::BusSlot;
use bus_notifier::model::NewSubscription;
use bus_notifier::model::Subscription;
use bus_notifier::subscription::SubscriptionStore;
use bus_notifier::subscription::error::StoreError;
use bus_notifier::subscription::memory_store::MemorySubscriptionStore;
use tokio::sync::Notify;

pub const USER: &str = "user-1";

/// Builds a stored subscription.
#[allow(dead_code)]
pub fn subscription(id: &str, station_id: &str, route_id: &str, alert_minutes: u32) -> Subscription {
    Subscription {
        id: id.to_string(),
        user_id: USER.to_string(),
        station_id: station_id.to_string(),
        route_id: route_id.to_string(),
        station_name: format!("Station {station_id}"),
        route_name: format!("Route {route_id}"),
        alert_minutes,
        ..Default::default()
    }
}

/// Builds a prediction whose buses are running.
#[allow(dead_code)]
pub fn prediction(
    route_id: &str,
    route_name: &str,
    first: Option<u32>,
    second: Option<u32>,
) -> ArrivalPrediction {
    let slot = |minutes: Option<u32>| BusSlot {
        remaining_minutes: minutes,
        in_service: true,
        ..Default::default()
    };
    ArrivalPrediction {
        route_id: route_id.to_string(),
        route_name: route_name.to_string(),
        station_name: None,
        first_bus: Some(slot(first)),
        second_bus: second.map(|m| slot(Some(m))),
    }
}

// MOCK ARRIVALS

/// Arrival source answering from a per-station table.
#[derive(Default)]
#[allow(dead_code)]
pub struct MockArrivals {
    pub state: Mutex<MockArrivalsState>,
    pub calls: AtomicUsize,
    /// When set, every fetch waits for a notification before answering.
    pub gate: Option<Arc<Notify>>,
    pub entered: Notify,
}

#[derive(Default)]
#[allow(dead_code)]
pub struct MockArrivalsState {
    pub arrivals: HashMap<String, Vec<ArrivalPrediction>>,
    pub failing: Vec<String>,
}

#[allow(dead_code)]
impl MockArrivals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn set(&self, station_id: &str, arrivals: Vec<ArrivalPrediction>) {
        self.state
            .lock()
            .unwrap()
            .arrivals
            .insert(station_id.to_string(), arrivals);
    }

    pub fn fail(&self, station_id: &str) {
        self.state.lock().unwrap().failing.push(station_id.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArrivalSource for MockArrivals {
    async fn fetch_arrivals(
        &self,
        station_id: &str,
    ) -> Result<Vec<ArrivalPrediction>, ArrivalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let state = self.state.lock().unwrap();
        if state.failing.iter().any(|s| s == station_id) {
            return Err(ArrivalError::StationNotFound {
                station_id: station_id.to_string(),
            });
        }
        Ok(state.arrivals.get(station_id).cloned().unwrap_or_default())
    }
}

// MOCK STORE

/// Memory store that counts calls and can refuse removals.
#[derive(Default)]
#[allow(dead_code)]
pub struct MockStore {
    pub inner: MemorySubscriptionStore,
    pub list_calls: AtomicUsize,
    pub removed: Mutex<Vec<String>>,
    pub fail_remove: AtomicBool,
}

#[allow(dead_code)]
impl MockStore {
    pub fn with(subscriptions: Vec<Subscription>) -> Self {
        let store = Self::default();
        for subscription in subscriptions {
            store.inner.insert(subscription);
        }
        store
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionStore for MockStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list(user_id).await
    }

    async fn add(&self, new_subscription: NewSubscription) -> Result<Subscription, StoreError> {
        self.inner.add(new_subscription).await
    }

    async fn remove(&self, user_id: &str, subscription_id: &str) -> Result<(), StoreError> {
        self.removed.lock().unwrap().push(subscription_id.to_string());
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(StoreError::ApiError {
                status: 500,
                message: "unavailable".to_string(),
            });
        }
        self.inner.remove(user_id, subscription_id).await
    }
}

// MOCK SINK

/// Alert sink recording every message it was asked to present.
#[derive(Default)]
#[allow(dead_code)]
pub struct MockSink {
    pub presented: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

#[allow(dead_code)]
impl MockSink {
    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn presented(&self) -> Vec<String> {
        self.presented.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for MockSink {
    async fn present(&self, alert: &Alert) -> Result<(), DeliveryError> {
        self.presented.lock().unwrap().push(alert.body.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::PermissionDenied);
        }
        Ok(())
    }
}
