use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::alerts::OutOfStockSummary;

/// How a fan-out went. Delivery is best effort per recipient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryReport {
    pub fn recipients(&self) -> usize {
        self.delivered + self.failed
    }

    pub fn all_delivered(&self) -> bool {
        self.failed == 0
    }
}

/// Trait for delivering alert messages to category subscribers.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `message` to every recipient subscribed to `category`.
    async fn notify(&self, category: &str, message: &str) -> DeliveryReport;

    /// Sends the summary once to every recipient subscribed to any of its
    /// categories. Each copy holds only the sections that recipient follows.
    async fn broadcast(&self, summary: &OutOfStockSummary) -> DeliveryReport;
}
