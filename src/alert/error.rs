#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DeliveryError {
    #[error("Notification permission was not granted.")]
    PermissionDenied,

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Alert was rejected by the receiver with status {status}.")]
    Rejected { status: u16 },

    #[error("No listener is attached to the alert channel.")]
    NoListeners,

    #[error("Failed to serialize alert: {0}")]
    SerializeFailed(#[from] serde_json::Error),

    #[error("{failed} of {total} alert channels failed.")]
    Partial { failed: usize, total: usize },
}

impl From<wreq::Error> for DeliveryError {
    fn from(e: wreq::Error) -> Self {
        DeliveryError::RequestFailed(Box::new(e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown notification permission `{value}`, expected default, granted or denied.")]
pub struct ParsePermissionError {
    pub value: String,
}
