//! Arrival predictions from the bus-info REST API.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use governor::Quota;
use governor::RateLimiter;
use governor::clock::QuantaClock;
use governor::state::InMemoryState;
use governor::state::direct::NotKeyed;
use log::debug;
use log::info;
use serde::Deserialize;
use serde_json::Value;
use url::Url;
use wreq::Client;
use wreq::StatusCode;
use wreq::header::HeaderMap;
use wreq::header::HeaderValue;
use wreq::header::USER_AGENT;

use crate::api_url;
use crate::arrival::ArrivalSource;
use crate::arrival::error::ArrivalError;
use crate::model::ArrivalPrediction;
use crate::model::BusSlot;

/// Flag value the API uses for a bus that is currently running.
const IN_SERVICE_FLAG: &str = "Y";

/// HTTP client for `GET /api/stations/{id}/arrivals`.
pub struct BusApiSource {
    base_url: Url,
    client: Client,
    limiter: RateLimiter<NotKeyed, InMemoryState, QuantaClock>,
}

impl BusApiSource {
    pub fn new(
        api_url: impl Into<String>,
        timeout: Duration,
        requests_per_second: NonZeroU32,
    ) -> Result<Self, ArrivalError> {
        let api_url = api_url.into();
        let base_url =
            api_url::parse_base(&api_url).ok_or(ArrivalError::InvalidUrl { url: api_url })?;
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("bus-notifier/0.1"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url,
            client,
            limiter: RateLimiter::direct(Quota::per_second(requests_per_second)),
        })
    }

    /// Takes one cell of the quota, waiting only when none is left.
    async fn acquire(&self) {
        if self.limiter.check().is_err() {
            info!("Arrival requests are ratelimited. Waiting...");
            self.limiter.until_ready().await;
        }
    }

    async fn send(&self, request: wreq::RequestBuilder) -> Result<wreq::Response, wreq::Error> {
        self.acquire().await;

        let req = request.build()?;
        debug!("Making request to: {}", req.url());
        self.client.execute(req).await
    }

    /// The API answers either with a bare array or with `{ "data": [...] }`.
    fn unwrap_data(resp: Value) -> Value {
        match resp {
            Value::Object(mut map) if map.contains_key("data") => {
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        }
    }
}

#[async_trait]
impl ArrivalSource for BusApiSource {
    async fn fetch_arrivals(
        &self,
        station_id: &str,
    ) -> Result<Vec<ArrivalPrediction>, ArrivalError> {
        debug!("Fetching arrivals for station_id: {station_id}");
        let url = api_url::endpoint(
            &self.base_url,
            &["api", "stations", station_id, "arrivals"],
            &[],
        );
        let request = self.client.get(url.as_str());
        let response = self.send(request).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ArrivalError::StationNotFound {
                station_id: station_id.to_string(),
            });
        }
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ArrivalError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let resp: Value = serde_json::from_str(&body)?;
        let arrivals = match Self::unwrap_data(resp) {
            Value::Null => Vec::new(),
            data => serde_json::from_value::<Vec<RawArrival>>(data)?,
        };
        Ok(arrivals.into_iter().map(ArrivalPrediction::from).collect())
    }
}

/// Flat wire shape of one arrival entry.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawArrival {
    route_id: Value,
    route_name: Option<String>,
    station_name: Option<String>,
    remain_min1: Option<u32>,
    remain_min2: Option<u32>,
    remain_stops1: Option<u32>,
    remain_stops2: Option<u32>,
    plate_no1: Option<String>,
    plate_no2: Option<String>,
    congestion1: Option<String>,
    congestion2: Option<String>,
    flag1: Option<String>,
    flag2: Option<String>,
}

fn value_to_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn to_slot(
    remaining_minutes: Option<u32>,
    remaining_stops: Option<u32>,
    plate_no: Option<String>,
    congestion: Option<String>,
    flag: Option<String>,
) -> Option<BusSlot> {
    let in_service = flag.as_deref() == Some(IN_SERVICE_FLAG);
    if remaining_minutes.is_none() && !in_service {
        return None;
    }
    Some(BusSlot {
        remaining_minutes,
        remaining_stops,
        plate_no: plate_no.filter(|p| !p.is_empty()),
        congestion: congestion.filter(|c| !c.is_empty()),
        in_service,
    })
}

impl From<RawArrival> for ArrivalPrediction {
    fn from(raw: RawArrival) -> Self {
        ArrivalPrediction {
            route_id: value_to_id(&raw.route_id),
            route_name: raw.route_name.unwrap_or_default(),
            station_name: raw.station_name.filter(|s| !s.is_empty()),
            first_bus: to_slot(
                raw.remain_min1,
                raw.remain_stops1,
                raw.plate_no1,
                raw.congestion1,
                raw.flag1,
            ),
            second_bus: to_slot(
                raw.remain_min2,
                raw.remain_stops2,
                raw.plate_no2,
                raw.congestion2,
                raw.flag2,
            ),
        }
    }
}
