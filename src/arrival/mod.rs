//! Live arrival data sources.

pub mod bus_api_source;
pub mod error;

use async_trait::async_trait;

use crate::arrival::error::ArrivalError;
use crate::model::ArrivalPrediction;

/// Provides live arrival predictions for a station.
#[async_trait]
pub trait ArrivalSource: Send + Sync {
    /// Fetches one prediction per route currently serving `station_id`.
    async fn fetch_arrivals(&self, station_id: &str)
    -> Result<Vec<ArrivalPrediction>, ArrivalError>;
}
