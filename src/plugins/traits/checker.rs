use async_trait::async_trait;

use crate::models::{CheckResult, ProductConfig};
use crate::utils::error::Result;

/// Decides whether a product page currently shows the item as purchasable.
///
/// `Ok` carries the classification, including "not available" outcomes.
/// `Err` means the check itself failed; the orchestrator records ordinary
/// errors as unavailable and aborts the run on structural ones
/// (see [`crate::AppError::is_structural`]).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityChecker: Send + Sync {
    /// Policy name this checker handles, matching `CheckPolicy::policy_type`.
    fn policy_type(&self) -> &'static str;

    async fn check(&self, product: &ProductConfig) -> Result<CheckResult>;
}
