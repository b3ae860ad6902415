//! Tri-state notification permission and the sink gated by it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use log::info;
use log::warn;

use crate::alert::Alert;
use crate::alert::AlertSink;
use crate::alert::error::DeliveryError;
use crate::alert::error::ParsePermissionError;

/// Whether the user allows system notifications.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Permission {
    /// Not decided yet; the user has to be asked.
    #[default]
    Default,
    Granted,
    Denied,
}

impl FromStr for Permission {
    type Err = ParsePermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Permission::Default),
            "granted" => Ok(Permission::Granted),
            "denied" => Ok(Permission::Denied),
            _ => Err(ParsePermissionError {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Permission::Default => "default",
            Permission::Granted => "granted",
            Permission::Denied => "denied",
        };
        f.write_str(s)
    }
}

/// Source of the permission state, able to ask the user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionPrompt: Send + Sync {
    fn current(&self) -> Permission;

    /// Asks the user and returns their answer.
    async fn request(&self) -> Permission;
}

/// Permission with a preconfigured answer to the prompt.
pub struct StaticPermission {
    state: RwLock<Permission>,
    answer: Permission,
}

impl StaticPermission {
    pub fn new(initial: Permission, answer: Permission) -> Self {
        Self {
            state: RwLock::new(initial),
            answer,
        }
    }
}

#[async_trait]
impl PermissionPrompt for StaticPermission {
    fn current(&self) -> Permission {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    async fn request(&self) -> Permission {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = self.answer;
        self.answer
    }
}

/// Delivers to `inner` only while permission is granted.
///
/// An undecided permission is requested once, before the first delivery.
pub struct PermissionGatedSink<S> {
    inner: S,
    prompt: Arc<dyn PermissionPrompt>,
    requested: AtomicBool,
}

impl<S: AlertSink> PermissionGatedSink<S> {
    pub fn new(inner: S, prompt: Arc<dyn PermissionPrompt>) -> Self {
        Self {
            inner,
            prompt,
            requested: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl<S: AlertSink> AlertSink for PermissionGatedSink<S> {
    async fn present(&self, alert: &Alert) -> Result<(), DeliveryError> {
        let mut permission = self.prompt.current();
        if permission == Permission::Default && !self.requested.swap(true, Ordering::SeqCst) {
            info!("Requesting notification permission.");
            permission = self.prompt.request().await;
            info!("Notification permission is now `{permission}`.");
        }

        if permission != Permission::Granted {
            warn!("Skipping notification, permission is `{permission}`.");
            return Err(DeliveryError::PermissionDenied);
        }
        self.inner.present(alert).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[derive(Default)]
    struct CountingSink {
        count: AtomicUsize,
    }

    #[async_trait]
    impl AlertSink for CountingSink {
        async fn present(&self, _alert: &Alert) -> Result<(), DeliveryError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_permission_parse() {
        assert_eq!("Granted".parse::<Permission>(), Ok(Permission::Granted));
        assert_eq!("denied".parse::<Permission>(), Ok(Permission::Denied));
        assert_eq!(
            "maybe".parse::<Permission>(),
            Err(ParsePermissionError {
                value: "maybe".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_default_permission_is_requested_once() {
        let mut prompt = MockPermissionPrompt::new();
        prompt.expect_current().return_const(Permission::Default);
        prompt.expect_request().times(1).return_const(Permission::Denied);

        let sink = PermissionGatedSink::new(CountingSink::default(), Arc::new(prompt));
        let alert = Alert::new("472 • Gangnam • within 3 minutes!");

        assert!(matches!(
            sink.present(&alert).await,
            Err(DeliveryError::PermissionDenied)
        ));
        assert!(matches!(
            sink.present(&alert).await,
            Err(DeliveryError::PermissionDenied)
        ));
        assert_eq!(sink.inner.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_granted_after_request_delivers() {
        let prompt = Arc::new(StaticPermission::new(Permission::Default, Permission::Granted));
        let sink = PermissionGatedSink::new(CountingSink::default(), prompt.clone());

        sink.present(&Alert::new("hello")).await.unwrap();
        sink.present(&Alert::new("again")).await.unwrap();

        assert_eq!(prompt.current(), Permission::Granted);
        assert_eq!(sink.inner.count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_denied_is_never_requested() {
        let mut prompt = MockPermissionPrompt::new();
        prompt.expect_current().return_const(Permission::Denied);
        prompt.expect_request().never();

        let sink = PermissionGatedSink::new(CountingSink::default(), Arc::new(prompt));
        assert!(sink.present(&Alert::new("hello")).await.is_err());
    }
}
