#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ArrivalError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to parse API response: {0}")]
    JsonParseFailed(#[from] serde_json::Error),

    #[error("Station not found (ID: {station_id}).")]
    StationNotFound { station_id: String },

    #[error("Invalid bus API base URL `{url}`.")]
    InvalidUrl { url: String },

    #[error("Bus API error ({status}): {message}")]
    ApiError { status: u16, message: String },
}

impl From<wreq::Error> for ArrivalError {
    fn from(e: wreq::Error) -> Self {
        ArrivalError::RequestFailed(Box::new(e))
    }
}
