//! Arrival alert subscriptions and their stores.

pub mod api_store;
pub mod error;
pub mod memory_store;
pub mod service;

use async_trait::async_trait;

use crate::model::NewSubscription;
use crate::model::Subscription;
use crate::subscription::error::StoreError;

/// Holds the active subscriptions of each user.
///
/// `list` returns subscriptions in a stable order; callers treat it as authoritative.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn list(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError>;

    async fn add(&self, new_subscription: NewSubscription) -> Result<Subscription, StoreError>;

    async fn remove(&self, user_id: &str, subscription_id: &str) -> Result<(), StoreError>;
}
