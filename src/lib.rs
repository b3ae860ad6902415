//! bus-notifier - Alerts users shortly before their bus reaches a stop.
//!
//! Users subscribe to a (station, route) pair with a threshold in minutes.
//! The [`task::arrival_poller::ArrivalNotificationPoller`] periodically checks
//! live arrival predictions and, once the next bus is within the threshold,
//! alerts the user and retires the subscription.

pub mod alert;
pub mod api_url;
pub mod arrival;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod model;
pub mod subscriber;
pub mod subscription;
pub mod task;
