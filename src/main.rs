//! Application entry point for bus-notifier.
//!
//! Wires the remote API clients, alert channels and the arrival poller.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use bus_notifier::alert::AlertSink;
use bus_notifier::alert::fanout_sink::FanoutAlertSink;
use bus_notifier::alert::permission::Permission;
use bus_notifier::alert::permission::PermissionGatedSink;
use bus_notifier::alert::permission::StaticPermission;
use bus_notifier::alert::toast_sink::ToastAlertSink;
use bus_notifier::alert::webhook_sink::WebhookAlertSink;
use bus_notifier::arrival::bus_api_source::BusApiSource;
use bus_notifier::config::Config;
use bus_notifier::event::ArrivalAlertEvent;
use bus_notifier::event::event_bus::EventBus;
use bus_notifier::logging::setup_logging;
use bus_notifier::subscriber::toast_log_subscriber::ToastLogSubscriber;
use bus_notifier::subscription::api_store::ApiSubscriptionStore;
use bus_notifier::task::arrival_poller::ArrivalNotificationPoller;
use dotenv::dotenv;
use log::debug;
use log::info;
use log::warn;
use tracing_appender::non_blocking::WorkerGuard;

/// Number of toasts kept by the console toast subscriber.
const TOAST_HISTORY: usize = 20;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let init_start = Instant::now();
    let (config, _log_guard) = load_config()?;

    let event_bus = Arc::new(EventBus::new());
    setup_subscribers(&event_bus);

    let alerts = setup_alerts(&config, event_bus.clone())?;
    let poller = setup_poller(&config, alerts)?;

    if !poller.arm(config.user_id.clone()) {
        warn!("USER_ID is not set, the arrival poller stays disarmed.");
    }

    run(init_start).await?;
    poller.disarm();
    Ok(())
}

fn load_config() -> Result<(Config, WorkerGuard)> {
    debug!("Loading configuration...");
    let mut config = Config::new();
    config.load()?;
    let log_guard = setup_logging(&config)?;
    info!("Starting bus-notifier...");
    Ok((config, log_guard))
}

fn setup_subscribers(event_bus: &EventBus) {
    debug!("Setting up Subscribers...");
    event_bus.register_subscriber::<ArrivalAlertEvent, _>(Arc::new(ToastLogSubscriber::new(
        TOAST_HISTORY,
    )));
}

fn setup_alerts(config: &Config, event_bus: Arc<EventBus>) -> Result<Arc<dyn AlertSink>> {
    debug!("Setting up alert channels...");
    let mut sink = FanoutAlertSink::new().with_sink(Arc::new(ToastAlertSink::new(event_bus)));

    match &config.webhook_url {
        Some(webhook_url) => {
            // Without an interactive user, the prompt is answered by the presence of a target.
            let prompt = Arc::new(StaticPermission::new(
                config.notification_permission,
                Permission::Granted,
            ));
            let webhook = WebhookAlertSink::new(webhook_url.clone(), config.request_timeout)?;
            sink = sink.with_sink(Arc::new(PermissionGatedSink::new(webhook, prompt)));
        }
        None => info!("WEBHOOK_URL is not set, system notifications are disabled."),
    }

    info!("Alert channels ready ({}).", sink.len());
    Ok(Arc::new(sink))
}

fn setup_poller(
    config: &Config,
    alerts: Arc<dyn AlertSink>,
) -> Result<Arc<ArrivalNotificationPoller>> {
    debug!("Setting up ArrivalNotificationPoller...");
    let rate_limit = NonZeroU32::new(config.arrivals_rate_limit).unwrap_or(NonZeroU32::MIN);
    let arrivals = Arc::new(BusApiSource::new(
        config.api_url.clone(),
        config.request_timeout,
        rate_limit,
    )?);
    let subscriptions = Arc::new(ApiSubscriptionStore::new(
        config.api_url.clone(),
        config.request_timeout,
    )?);

    Ok(ArrivalNotificationPoller::new(
        subscriptions,
        arrivals,
        alerts,
        config.poll_interval,
    ))
}

async fn run(init_start: Instant) -> Result<()> {
    info!(
        "bus-notifier is up in {:.2}s. Press Ctrl+C to stop.",
        init_start.elapsed().as_secs_f64()
    );

    tokio::signal::ctrl_c().await?;
    info!("Ctrl+C received, shutting down.");

    Ok(())
}
