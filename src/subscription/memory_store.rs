//! Process-local subscription store.

use std::sync::RwLock;

use async_trait::async_trait;
use log::debug;
use uuid::Uuid;

use crate::model::NewSubscription;
use crate::model::Subscription;
use crate::subscription::SubscriptionStore;
use crate::subscription::error::StoreError;

/// Keeps subscriptions in insertion order. Duplicate (station, route) pairs are kept as-is.
#[derive(Default)]
pub struct MemorySubscriptionStore {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed subscription, keeping its id.
    pub fn insert(&self, subscription: Subscription) {
        self.subscriptions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError> {
        let subscriptions = self.subscriptions.read().unwrap_or_else(|e| e.into_inner());
        Ok(subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn add(&self, new_subscription: NewSubscription) -> Result<Subscription, StoreError> {
        if new_subscription.alert_minutes == 0 {
            return Err(StoreError::InvalidThreshold { minutes: 0 });
        }
        let subscription = new_subscription.into_subscription(Uuid::new_v4().to_string());
        debug!(
            "Adding subscription `{}` for user `{}`.",
            subscription.id, subscription.user_id
        );
        self.insert(subscription.clone());
        Ok(subscription)
    }

    async fn remove(&self, user_id: &str, subscription_id: &str) -> Result<(), StoreError> {
        let mut subscriptions = self.subscriptions.write().unwrap_or_else(|e| e.into_inner());
        let position = subscriptions
            .iter()
            .position(|s| s.id == subscription_id && s.user_id == user_id)
            .ok_or_else(|| StoreError::NotFound {
                subscription_id: subscription_id.to_string(),
            })?;
        subscriptions.remove(position);
        Ok(())
    }
}
