//! Shows in-app toasts on the console.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use log::info;

use super::Subscriber;
use crate::event::ArrivalAlertEvent;

/// Logs every toast and keeps the most recent ones.
pub struct ToastLogSubscriber {
    capacity: usize,
    recent: Mutex<VecDeque<String>>,
}

impl ToastLogSubscriber {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            recent: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Recent toast messages, oldest first.
    pub fn recent(&self) -> Vec<String> {
        self.recent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl Subscriber<ArrivalAlertEvent> for ToastLogSubscriber {
    async fn callback(&self, event: ArrivalAlertEvent) -> Result<()> {
        info!("🚌 {}: {}", event.alert.title, event.message());

        let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        if self.capacity > 0 && recent.len() == self.capacity {
            recent.pop_front();
        }
        if self.capacity > 0 {
            recent.push_back(event.message().to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Alert;

    #[tokio::test]
    async fn test_keeps_most_recent_toasts() {
        let subscriber = ToastLogSubscriber::new(2);
        for message in ["a", "b", "c"] {
            subscriber
                .callback(ArrivalAlertEvent::new(Alert::new(message)))
                .await
                .unwrap();
        }

        assert_eq!(subscriber.recent(), vec!["b".to_string(), "c".to_string()]);
    }
}
