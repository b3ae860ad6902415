//! Subscriptions kept by the remote notifications API.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use url::Url;
use wreq::Client;
use wreq::StatusCode;
use wreq::header::CONTENT_TYPE;
use wreq::header::HeaderMap;
use wreq::header::HeaderValue;
use wreq::header::USER_AGENT;

use crate::api_url;
use crate::model::NewSubscription;
use crate::model::Subscription;
use crate::subscription::SubscriptionStore;
use crate::subscription::error::StoreError;

/// HTTP client for the `/api/notifications` resource.
pub struct ApiSubscriptionStore {
    base_url: Url,
    client: Client,
}

impl ApiSubscriptionStore {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let api_url = api_url.into();
        let base_url =
            api_url::parse_base(&api_url).ok_or(StoreError::InvalidUrl { url: api_url })?;
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("bus-notifier/0.1"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url,
            client,
        })
    }

    async fn send(&self, request: wreq::RequestBuilder) -> Result<(StatusCode, String), StoreError> {
        let req = request.build()?;
        debug!("Making request to: {} {}", req.method(), req.url());
        let response = self.client.execute(req).await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    fn check_status(
        status: StatusCode,
        body: String,
        user_id: &str,
        subscription_id: Option<&str>,
    ) -> Result<String, StoreError> {
        match (status, subscription_id) {
            (s, _) if s.is_success() => Ok(body),
            (StatusCode::NOT_FOUND, Some(id)) => Err(StoreError::NotFound {
                subscription_id: id.to_string(),
            }),
            (StatusCode::FORBIDDEN, _) => Err(StoreError::Forbidden {
                user_id: user_id.to_string(),
            }),
            (s, _) => Err(StoreError::ApiError {
                status: s.as_u16(),
                message: body,
            }),
        }
    }

    /// Accepts both a bare payload and one wrapped in `{ "data": ... }`.
    fn parse_payload<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, StoreError> {
        let resp: Value = serde_json::from_str(body)?;
        let data = match resp {
            Value::Object(mut map) if map.contains_key("data") => {
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        };
        Ok(serde_json::from_value(data)?)
    }
}

#[async_trait]
impl SubscriptionStore for ApiSubscriptionStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Subscription>, StoreError> {
        let url = api_url::endpoint(
            &self.base_url,
            &["api", "notifications"],
            &[("userId", user_id)],
        );
        let request = self.client.get(url.as_str());
        let (status, body) = self.send(request).await?;
        let body = Self::check_status(status, body, user_id, None)?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Self::parse_payload::<Option<Vec<Subscription>>>(&body).map(Option::unwrap_or_default)
    }

    async fn add(&self, new_subscription: NewSubscription) -> Result<Subscription, StoreError> {
        if new_subscription.alert_minutes == 0 {
            return Err(StoreError::InvalidThreshold { minutes: 0 });
        }
        let payload = serde_json::to_string(&new_subscription)?;
        let url = api_url::endpoint(&self.base_url, &["api", "notifications"], &[]);
        let request = self.client.post(url.as_str()).body(payload);
        let (status, body) = self.send(request).await?;
        let body = Self::check_status(status, body, &new_subscription.user_id, None)?;
        Self::parse_payload(&body)
    }

    async fn remove(&self, user_id: &str, subscription_id: &str) -> Result<(), StoreError> {
        let url = api_url::endpoint(
            &self.base_url,
            &["api", "notifications", subscription_id],
            &[("userId", user_id)],
        );
        let request = self.client.delete(url.as_str());
        let (status, body) = self.send(request).await?;
        Self::check_status(status, body, user_id, Some(subscription_id))?;
        Ok(())
    }
}
