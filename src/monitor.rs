use chrono::Utc;
use std::fmt;
use std::sync::Arc;

use crate::models::{CheckResult, ProductConfig};
use crate::plugins::traits::{AvailabilityAlert, Notifier};
use crate::plugins::CheckerRegistry;
use crate::status_store::{StatusMap, StatusStore};
use crate::utils::error::Result;

/// How a product's availability moved since the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    BecameAvailable,
    StillAvailable,
    NotAvailable,
}

impl Transition {
    pub fn between(was_available: bool, is_available: bool) -> Self {
        match (was_available, is_available) {
            (false, true) => Transition::BecameAvailable,
            (true, true) => Transition::StillAvailable,
            (_, false) => Transition::NotAvailable,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub checked: usize,
    pub available: usize,
    pub notifications_sent: usize,
    pub notification_failures: usize,
    pub status_saved: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📊 Summary:")?;
        writeln!(f, "   Products checked: {}", self.checked)?;
        writeln!(f, "   Products available: {}", self.available)?;
        writeln!(f, "   Notifications sent: {}", self.notifications_sent)?;
        if self.notification_failures > 0 {
            writeln!(f, "   Notifications failed: {}", self.notification_failures)?;
        }
        write!(
            f,
            "   Status saved: {}",
            if self.status_saved { "✅" } else { "❌" }
        )
    }
}

/// One pass over the configured products.
pub struct Monitor {
    products: Vec<ProductConfig>,
    checkers: CheckerRegistry,
    notifier: Arc<dyn Notifier>,
    store: StatusStore,
}

impl Monitor {
    pub fn new(
        products: Vec<ProductConfig>,
        checkers: CheckerRegistry,
        notifier: Arc<dyn Notifier>,
        store: StatusStore,
    ) -> Self {
        Self {
            products,
            checkers,
            notifier,
            store,
        }
    }

    /// Check every product in order, alert on false→true transitions and
    /// persist the new statuses.
    ///
    /// A structural failure stops the run at once and nothing is saved.
    pub async fn run(&self) -> Result<RunSummary> {
        let previous = self.store.load();
        let mut current = StatusMap::new();
        let mut summary = RunSummary::default();
        let total = self.products.len();

        for (index, product) in self.products.iter().enumerate() {
            tracing::info!("📦 Checking product {}/{}: {}", index + 1, total, product.name);

            let result = self.check_product(product).await?;
            let key = product.status_key();
            let was_available = previous.get(&key).copied().unwrap_or(false);
            current.insert(key, result.available);

            summary.checked += 1;
            if result.available {
                summary.available += 1;
            }

            match Transition::between(was_available, result.available) {
                Transition::BecameAvailable => {
                    tracing::info!("🎉 {} became available!", product.name);
                    // A failed alert is not retried: the product is still recorded as available.
                    if self.notify(product, &result).await {
                        summary.notifications_sent += 1;
                    } else {
                        summary.notification_failures += 1;
                    }
                }
                Transition::StillAvailable => {
                    tracing::info!("✅ {} still available", product.name);
                }
                Transition::NotAvailable => {
                    tracing::info!("❌ {} not available ({})", product.name, result.message);
                }
            }
        }

        summary.status_saved = self.store.save(&current);
        Ok(summary)
    }

    /// Run the product's checker. Ordinary failures become an unavailable
    /// result; structural failures are passed up.
    async fn check_product(&self, product: &ProductConfig) -> Result<CheckResult> {
        let outcome = match self.checkers.get(product.policy_type()) {
            Ok(checker) => checker.check(product).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => Ok(result),
            Err(e) if e.is_structural() => {
                tracing::error!("Aborting run: {}", e);
                Err(e)
            }
            Err(e) => {
                tracing::warn!("Error checking {}: {}", product.url, e);
                Ok(CheckResult::unavailable(format!("Error: {}", e)))
            }
        }
    }

    async fn notify(&self, product: &ProductConfig, result: &CheckResult) -> bool {
        let alert = AvailabilityAlert::new(product, result, Utc::now());
        self.notifier.send(&alert.subject, &alert.body).await
    }
}
