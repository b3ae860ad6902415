//! Background task that turns imminent bus arrivals into one-shot alerts.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Weak;
use std::time::Duration;

use log::debug;
use log::error;
use log::info;
use log::warn;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;

use crate::alert::Alert;
use crate::alert::AlertSink;
use crate::arrival::ArrivalSource;
use crate::arrival::error::ArrivalError;
use crate::model::ArrivalPrediction;
use crate::model::Subscription;
use crate::subscription::SubscriptionStore;

/// Time between two passes unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Station label used when neither the prediction nor the subscription names one.
pub const STATION_FALLBACK: &str = "station";

/// Lifecycle of an [`ArrivalNotificationPoller`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollerState {
    Disarmed,
    Armed { user_id: String },
}

struct Cycle {
    user_id: String,
    // Dropping or firing this ends the cycle's loop.
    stop: oneshot::Sender<()>,
}

/// Periodically checks a user's subscriptions against live arrivals.
///
/// Each pass alerts for at most one subscription: the first one, in store
/// order, whose next bus is within its threshold. That subscription is then
/// removed. Passes never overlap; a pass requested while another runs is
/// dropped.
pub struct ArrivalNotificationPoller {
    subscriptions: Arc<dyn SubscriptionStore>,
    arrivals: Arc<dyn ArrivalSource>,
    alerts: Arc<dyn AlertSink>,
    poll_interval: Duration,
    cycle: Mutex<Option<Cycle>>,
    pass: tokio::sync::Mutex<()>,
}

impl ArrivalNotificationPoller {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        arrivals: Arc<dyn ArrivalSource>,
        alerts: Arc<dyn AlertSink>,
        poll_interval: Duration,
    ) -> Arc<Self> {
        let poll_interval = if poll_interval.is_zero() {
            warn!("Poll interval must be non-zero, using {DEFAULT_POLL_INTERVAL:?}.");
            DEFAULT_POLL_INTERVAL
        } else {
            poll_interval
        };
        info!("Initializing ArrivalNotificationPoller with poll interval {poll_interval:?}");
        Arc::new(Self {
            subscriptions,
            arrivals,
            alerts,
            poll_interval,
            cycle: Mutex::new(None),
            pass: tokio::sync::Mutex::new(()),
        })
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn state(&self) -> PollerState {
        match self.armed_user() {
            Some(user_id) => PollerState::Armed { user_id },
            None => PollerState::Disarmed,
        }
    }

    /// Starts the recurring cycle for `user_id`.
    ///
    /// Returns `false` without starting anything when the id is absent or
    /// blank, or when the poller is already armed for the same user. Arming
    /// for another user replaces the running cycle.
    pub fn arm(self: &Arc<Self>, user_id: Option<String>) -> bool {
        let Some(user_id) = user_id.filter(|id| !id.trim().is_empty()) else {
            debug!("No user to arm the arrival poller for.");
            return false;
        };

        let stop_rx = {
            let mut cycle = self.lock_cycle();
            if let Some(current) = cycle.as_ref()
                && current.user_id == user_id
            {
                return false;
            }
            if let Some(previous) = cycle.take() {
                info!(
                    "Replacing arrival check loop of user `{}` with user `{user_id}`.",
                    previous.user_id
                );
                let _ = previous.stop.send(());
            }

            let (stop_tx, stop_rx) = oneshot::channel();
            info!("Starting arrival check loop for user `{user_id}`.");
            *cycle = Some(Cycle {
                user_id,
                stop: stop_tx,
            });
            stop_rx
        };

        self.spawn_check_loop(stop_rx);
        true
    }

    /// Stops scheduling passes. A pass already running is left to finish.
    pub fn disarm(&self) {
        if let Some(cycle) = self.lock_cycle().take() {
            info!("Stopping arrival check loop for user `{}`.", cycle.user_id);
            let _ = cycle.stop.send(());
        }
    }

    /// Keeps the poller armed for whoever is signed in on `session`.
    ///
    /// The returned task ends, disarming the poller, once the sender is dropped.
    pub fn follow_session(
        self: &Arc<Self>,
        mut session: watch::Receiver<Option<String>>,
    ) -> JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move {
            loop {
                let user_id = session.borrow_and_update().clone();
                match user_id.filter(|id| !id.trim().is_empty()) {
                    Some(user_id) => {
                        poller.arm(Some(user_id));
                    }
                    None => poller.disarm(),
                }
                if session.changed().await.is_err() {
                    break;
                }
            }
            debug!("Session channel closed.");
            poller.disarm();
        })
    }

    /// Runs a single pass and returns the alert message it produced, if any.
    ///
    /// Never fails: errors of individual collaborators are logged and skipped.
    pub async fn evaluate_once(&self) -> Option<String> {
        let Some(user_id) = self.armed_user() else {
            debug!("Arrival poller is disarmed, skipping pass.");
            return None;
        };
        let Ok(_pass) = self.pass.try_lock() else {
            debug!("Previous pass is still running, skipping.");
            return None;
        };

        let subscriptions = match self.subscriptions.list(&user_id).await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                error!("Error listing subscriptions of user `{user_id}`: {e}");
                return None;
            }
        };
        if subscriptions.is_empty() {
            return None;
        }
        debug!(
            "Checking {} subscriptions of user `{user_id}`.",
            subscriptions.len()
        );

        for subscription in &subscriptions {
            match self.check_subscription(subscription).await {
                Ok(Some(message)) => {
                    self.retire(subscription, &message).await;
                    return Some(message);
                }
                Ok(None) => {}
                Err(e) => warn!(
                    "Error checking {}: {e}",
                    Self::get_subscription_desc(subscription)
                ),
            }
        }

        debug!("No subscription of user `{user_id}` is due.");
        None
    }

    async fn check_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<Option<String>, ArrivalError> {
        let predictions = self
            .arrivals
            .fetch_arrivals(&subscription.station_id)
            .await?;

        let Some(prediction) = predictions
            .iter()
            .find(|p| p.route_id == subscription.route_id)
        else {
            debug!(
                "Route is not serving the station for {}.",
                Self::get_subscription_desc(subscription)
            );
            return Ok(None);
        };

        if !Self::is_due(prediction, subscription.alert_minutes) {
            return Ok(None);
        }
        Ok(Some(Self::build_message(prediction, subscription)))
    }

    /// Presents the alert, then removes the subscription even if presenting failed.
    async fn retire(&self, subscription: &Subscription, message: &str) {
        info!(
            "Bus is due for {}: {message}",
            Self::get_subscription_desc(subscription)
        );

        if let Err(e) = self.alerts.present(&Alert::new(message)).await {
            warn!(
                "Failed to deliver alert for {}: {e}",
                Self::get_subscription_desc(subscription)
            );
        }

        if let Err(e) = self
            .subscriptions
            .remove(&subscription.user_id, &subscription.id)
            .await
        {
            error!(
                "Failed to remove {}: {e}",
                Self::get_subscription_desc(subscription)
            );
        }
    }

    /// Only the first bus counts; an unknown remaining time never matches.
    fn is_due(prediction: &ArrivalPrediction, alert_minutes: u32) -> bool {
        matches!(prediction.first_remaining_minutes(), Some(minutes) if minutes <= alert_minutes)
    }

    fn build_message(prediction: &ArrivalPrediction, subscription: &Subscription) -> String {
        let route_name = Some(prediction.route_name.as_str())
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(subscription.route_name.as_str());
        let station_name = prediction
            .station_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or(Some(subscription.station_name.as_str()).filter(|name| !name.trim().is_empty()))
            .unwrap_or(STATION_FALLBACK);

        format_alert_message(route_name, station_name, subscription.alert_minutes)
    }

    fn get_subscription_desc(subscription: &Subscription) -> String {
        format!(
            "subscription `{}` (route `{}` at station `{}`)",
            subscription.id, subscription.route_id, subscription.station_id
        )
    }

    fn armed_user(&self) -> Option<String> {
        self.lock_cycle().as_ref().map(|c| c.user_id.clone())
    }

    fn lock_cycle(&self) -> std::sync::MutexGuard<'_, Option<Cycle>> {
        self.cycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn spawn_check_loop(self: &Arc<Self>, mut stop: oneshot::Receiver<()>) {
        let poller: Weak<Self> = Arc::downgrade(self);
        let period = self.poll_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = interval.tick() => {}
                }
                let Some(poller) = poller.upgrade() else {
                    break;
                };
                if let Some(message) = poller.evaluate_once().await {
                    debug!("Pass produced alert: {message}");
                }
            }
            debug!("Arrival check loop stopped.");
        });
    }
}

impl Drop for ArrivalNotificationPoller {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// Formats the text shown to the user for a due subscription.
pub fn format_alert_message(route_name: &str, station_name: &str, alert_minutes: u32) -> String {
    format!("{route_name} • {station_name} • within {alert_minutes} minutes!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BusSlot;

    fn prediction(first: Option<u32>, second: Option<u32>) -> ArrivalPrediction {
        let slot = |minutes| BusSlot {
            remaining_minutes: minutes,
            in_service: true,
            ..Default::default()
        };
        ArrivalPrediction {
            route_id: "r1".to_string(),
            route_name: "472".to_string(),
            station_name: None,
            first_bus: first.map(|m| slot(Some(m))),
            second_bus: second.map(|m| slot(Some(m))),
        }
    }

    fn subscription(station_name: &str) -> Subscription {
        Subscription {
            id: "1".to_string(),
            user_id: "u1".to_string(),
            station_id: "s1".to_string(),
            route_id: "r1".to_string(),
            station_name: station_name.to_string(),
            route_name: "old label".to_string(),
            alert_minutes: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_is_due_boundary() {
        assert!(ArrivalNotificationPoller::is_due(&prediction(Some(5), None), 5));
        assert!(ArrivalNotificationPoller::is_due(&prediction(Some(0), None), 5));
        assert!(!ArrivalNotificationPoller::is_due(&prediction(Some(6), None), 5));
    }

    #[test]
    fn test_is_due_ignores_second_bus_and_unknown_time() {
        assert!(!ArrivalNotificationPoller::is_due(&prediction(None, Some(1)), 5));
        assert!(!ArrivalNotificationPoller::is_due(&prediction(Some(9), Some(1)), 5));

        let mut unknown = prediction(None, None);
        unknown.first_bus = Some(BusSlot {
            remaining_minutes: None,
            in_service: true,
            ..Default::default()
        });
        assert!(!ArrivalNotificationPoller::is_due(&unknown, u32::MAX));
    }

    #[test]
    fn test_message_format() {
        assert_eq!(
            format_alert_message("472", "강남역", 3),
            "472 • 강남역 • within 3 minutes!"
        );
    }

    #[test]
    fn test_message_label_fallbacks() {
        let mut p = prediction(Some(1), None);
        assert_eq!(
            ArrivalNotificationPoller::build_message(&p, &subscription("강남역")),
            "472 • 강남역 • within 3 minutes!"
        );
        assert_eq!(
            ArrivalNotificationPoller::build_message(&p, &subscription("")),
            "472 • station • within 3 minutes!"
        );

        p.station_name = Some("Gangnam".to_string());
        p.route_name = String::new();
        assert_eq!(
            ArrivalNotificationPoller::build_message(&p, &subscription("강남역")),
            "old label • Gangnam • within 3 minutes!"
        );
    }
}
