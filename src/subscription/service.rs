//! Subscription management on behalf of a user.

use std::sync::Arc;

use log::info;

use crate::model::NewSubscription;
use crate::model::Subscription;
use crate::subscription::SubscriptionStore;
use crate::subscription::error::StoreError;

/// Outcome of [`SubscriptionService::toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleResult {
    Subscribed(Subscription),
    Unsubscribed(Subscription),
}

/// Higher-level operations over a [`SubscriptionStore`].
pub struct SubscriptionService {
    pub store: Arc<dyn SubscriptionStore>,
}

impl SubscriptionService {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError> {
        self.store.list(user_id).await
    }

    pub async fn subscribe(
        &self,
        new_subscription: NewSubscription,
    ) -> Result<Subscription, StoreError> {
        let subscription = self.store.add(new_subscription).await?;
        info!(
            "User `{}` subscribed to route `{}` at station `{}` ({} min).",
            subscription.user_id,
            subscription.route_id,
            subscription.station_id,
            subscription.alert_minutes
        );
        Ok(subscription)
    }

    pub async fn unsubscribe(&self, user_id: &str, subscription_id: &str) -> Result<(), StoreError> {
        self.store.remove(user_id, subscription_id).await?;
        info!("User `{user_id}` removed subscription `{subscription_id}`.");
        Ok(())
    }

    /// First subscription of `user_id` watching the (station, route) pair.
    pub async fn find(
        &self,
        user_id: &str,
        station_id: &str,
        route_id: &str,
    ) -> Result<Option<Subscription>, StoreError> {
        Ok(self
            .store
            .list(user_id)
            .await?
            .into_iter()
            .find(|s| s.watches(station_id, route_id)))
    }

    pub async fn is_subscribed(
        &self,
        user_id: &str,
        station_id: &str,
        route_id: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.find(user_id, station_id, route_id).await?.is_some())
    }

    /// Removes the existing subscription for the pair, or creates `new_subscription`.
    pub async fn toggle(
        &self,
        new_subscription: NewSubscription,
    ) -> Result<ToggleResult, StoreError> {
        let existing = self
            .find(
                &new_subscription.user_id,
                &new_subscription.station_id,
                &new_subscription.route_id,
            )
            .await?;

        match existing {
            Some(subscription) => {
                self.unsubscribe(&subscription.user_id, &subscription.id)
                    .await?;
                Ok(ToggleResult::Unsubscribed(subscription))
            }
            None => Ok(ToggleResult::Subscribed(
                self.subscribe(new_subscription).await?,
            )),
        }
    }
}
