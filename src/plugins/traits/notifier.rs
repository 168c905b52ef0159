use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{CheckResult, ProductConfig};

/// Subject and body of a "back in stock" message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityAlert {
    pub subject: String,
    pub body: String,
}

impl AvailabilityAlert {
    pub fn new(product: &ProductConfig, result: &CheckResult, checked_at: DateTime<Utc>) -> Self {
        let subject = format!("🎉 {} is NOW AVAILABLE!", product.name);
        let body = format!(
            "🎉 Great news! Your monitored product is now available!\n\n\
             Product: {}\n\
             Status: {}\n\
             URL: {}\n\
             Time: {}\n\n\
             Go grab it now!\n\n\
             ---\n\
             Sent by restock-watcher\n",
            product.name,
            result.message,
            product.url,
            checked_at.format("%Y-%m-%d %H:%M:%S UTC"),
        );

        Self { subject, body }
    }
}

/// Delivery channel for availability alerts.
///
/// Implementations never return errors: delivery problems are logged and
/// reported as `false` so a failed alert cannot abort a run.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, subject: &str, body: &str) -> bool;

    /// Connect and authenticate without sending anything.
    async fn test_connection(&self) -> bool;
}
