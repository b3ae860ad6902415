//! Domain models shared by the poller and its collaborators.

use chrono::DateTime;
use chrono::Utc;
use derive_builder::Builder;
use serde::Deserialize;
use serde::Serialize;

/// Alert threshold used when a subscription is created without one.
pub const DEFAULT_ALERT_MINUTES: u32 = 3;

/// A user's request to be alerted when a route is about to reach a stop.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(deserialize_with = "de_id")]
    pub user_id: String,
    #[serde(deserialize_with = "de_id")]
    pub station_id: String,
    #[serde(deserialize_with = "de_id")]
    pub route_id: String,
    /// Display label, not authoritative.
    #[serde(default)]
    pub station_name: String,
    /// Display label, not authoritative.
    #[serde(default)]
    pub route_name: String,
    /// Alert fires when the first bus is at most this many minutes away.
    pub alert_minutes: u32,
    #[serde(default = "Utc::now", alias = "startTime")]
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether this subscription watches the given (station, route) pair.
    pub fn watches(&self, station_id: &str, route_id: &str) -> bool {
        self.station_id == station_id && self.route_id == route_id
    }
}

/// Creation request for a [`Subscription`]. The store assigns the id.
#[derive(Builder, Serialize, Clone, Debug, PartialEq, Eq)]
#[builder(pattern = "immutable")]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
    #[builder(setter(into))]
    pub user_id: String,
    #[builder(setter(into))]
    pub station_id: String,
    #[builder(setter(into))]
    pub route_id: String,
    #[builder(default, setter(into))]
    pub station_name: String,
    #[builder(default, setter(into))]
    pub route_name: String,
    #[builder(default = "DEFAULT_ALERT_MINUTES")]
    pub alert_minutes: u32,
    #[builder(default = "Utc::now()")]
    #[serde(rename = "startTime")]
    pub created_at: DateTime<Utc>,
}

impl NewSubscription {
    pub fn builder() -> NewSubscriptionBuilder {
        NewSubscriptionBuilder::default()
    }

    pub fn into_subscription(self, id: String) -> Subscription {
        Subscription {
            id,
            user_id: self.user_id,
            station_id: self.station_id,
            route_id: self.route_id,
            station_name: self.station_name,
            route_name: self.route_name,
            alert_minutes: self.alert_minutes,
            created_at: self.created_at,
        }
    }
}

/// State of one tracked bus approaching a stop.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq)]
pub struct BusSlot {
    /// `None` when the upstream service has no estimate.
    pub remaining_minutes: Option<u32>,
    pub remaining_stops: Option<u32>,
    pub plate_no: Option<String>,
    pub congestion: Option<String>,
    pub in_service: bool,
}

/// Live arrival estimate for one route at one station.
///
/// Up to two buses are tracked per route. Only ever fetched fresh.
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq, Eq)]
pub struct ArrivalPrediction {
    pub route_id: String,
    pub route_name: String,
    pub station_name: Option<String>,
    pub first_bus: Option<BusSlot>,
    pub second_bus: Option<BusSlot>,
}

impl ArrivalPrediction {
    /// Remaining minutes of the first upcoming bus, if known.
    pub fn first_remaining_minutes(&self) -> Option<u32> {
        self.first_bus.as_ref().and_then(|bus| bus.remaining_minutes)
    }

    /// Whether any tracked bus of this route is currently running.
    pub fn in_service(&self) -> bool {
        [&self.first_bus, &self.second_bus]
            .into_iter()
            .flatten()
            .any(|bus| bus.in_service)
    }
}

/// Accepts ids sent either as JSON strings or numbers.
fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}
