#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to parse API response: {0}")]
    JsonParseFailed(#[from] serde_json::Error),

    #[error("Subscription not found (ID: {subscription_id}).")]
    NotFound { subscription_id: String },

    #[error("User `{user_id}` may not modify this subscription.")]
    Forbidden { user_id: String },

    #[error("Alert threshold must be at least one minute, got {minutes}.")]
    InvalidThreshold { minutes: u32 },

    #[error("Invalid subscription API base URL `{url}`.")]
    InvalidUrl { url: String },

    #[error("Subscription API error ({status}): {message}")]
    ApiError { status: u16, message: String },
}

impl From<wreq::Error> for StoreError {
    fn from(e: wreq::Error) -> Self {
        StoreError::RequestFailed(Box::new(e))
    }
}
