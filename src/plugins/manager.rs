use std::collections::HashMap;
use std::sync::Arc;

use super::checkers::{ClickabilityChecker, KeywordChecker};
use super::traits::AvailabilityChecker;
use crate::config::ScraperConfig;
use crate::utils::error::{AppError, Result};

pub type CheckerBox = Arc<dyn AvailabilityChecker>;

/// Maps a product's policy name to the checker that implements it.
#[derive(Clone, Default)]
pub struct CheckerRegistry {
    checkers: HashMap<String, CheckerBox>,
}

impl CheckerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the HTTP keyword checker and the browser clickability checker.
    pub fn with_default_checkers(config: &ScraperConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(KeywordChecker::new(config)?));
        registry.register(Arc::new(ClickabilityChecker::new(config.clone())));
        Ok(registry)
    }

    /// Register a checker, replacing any previous one for the same policy.
    pub fn register(&mut self, checker: CheckerBox) {
        let policy_type = checker.policy_type().to_string();
        tracing::debug!("Registered {} checker", policy_type);
        self.checkers.insert(policy_type, checker);
    }

    pub fn list_policy_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.checkers.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn get(&self, policy_type: &str) -> Result<&CheckerBox> {
        self.checkers.get(policy_type).ok_or_else(|| {
            AppError::Validation(format!("No checker registered for '{}' policy", policy_type))
        })
    }
}
