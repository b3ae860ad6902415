//! Delivery to several channels at once.

use std::sync::Arc;

use async_trait::async_trait;
use log::warn;

use crate::alert::Alert;
use crate::alert::AlertSink;
use crate::alert::error::DeliveryError;

/// Presents every alert on all channels, best effort.
#[derive(Default)]
pub struct FanoutAlertSink {
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl FanoutAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl AlertSink for FanoutAlertSink {
    async fn present(&self, alert: &Alert) -> Result<(), DeliveryError> {
        let mut failed = 0;
        for sink in &self.sinks {
            if let Err(e) = sink.present(alert).await {
                warn!("Alert channel failed: {e}");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(DeliveryError::Partial {
                failed,
                total: self.sinks.len(),
            });
        }
        Ok(())
    }
}
