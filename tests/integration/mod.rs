// Integration tests for restock-watcher
// These tests drive whole monitor runs against fake checkers and notifiers

pub mod run_lifecycle_tests;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use restock_watcher::config::ScraperConfig;
use restock_watcher::models::{CheckPolicy, CheckResult, ProductConfig};
use restock_watcher::plugins::{AvailabilityChecker, CheckerRegistry, Notifier};
use restock_watcher::{AppError, Monitor, StatusStore};

/// What the scripted checker should report for a product.
#[derive(Debug, Clone)]
pub enum Scripted {
    Available,
    Unavailable,
    Failure(String),
    Structural(String),
}

/// Checker whose answers are set per product name and can change between runs.
#[derive(Default)]
pub struct ScriptedChecker {
    outcomes: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedChecker {
    pub fn set(&self, product: &str, outcome: Scripted) {
        self.outcomes.lock().unwrap().insert(product.to_string(), outcome);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AvailabilityChecker for ScriptedChecker {
    fn policy_type(&self) -> &'static str {
        CheckPolicy::KEYWORD
    }

    async fn check(&self, product: &ProductConfig) -> restock_watcher::Result<CheckResult> {
        self.calls.lock().unwrap().push(product.name.clone());
        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .get(&product.name)
            .cloned()
            .unwrap_or(Scripted::Unavailable);

        match outcome {
            Scripted::Available => Ok(CheckResult::available("Found: add to cart")),
            Scripted::Unavailable => Ok(CheckResult::unavailable("Current status: sold out...")),
            Scripted::Failure(message) => Err(AppError::Browser(message)),
            Scripted::Structural(reason) => Err(AppError::structural(&product.name, reason)),
        }
    }
}

/// Notifier that records every message instead of sending it.
pub struct RecordingNotifier {
    delivered: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new(delivered: bool) -> Self {
        Self {
            delivered,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, subject: &str, body: &str) -> bool {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        self.delivered
    }

    async fn test_connection(&self) -> bool {
        self.delivered
    }
}

pub fn keyword_product(name: &str, url: &str) -> ProductConfig {
    ProductConfig {
        name: name.to_string(),
        url: url.to_string(),
        key: None,
        policy: CheckPolicy::Keyword {
            selector: ".buy".to_string(),
            keywords: vec!["add to cart".to_string(), "available".to_string()],
        },
    }
}

pub fn get_test_scraper_config() -> ScraperConfig {
    ScraperConfig {
        request_timeout: 5,
        navigation_timeout: 10,
        element_wait: 5,
        hover_timeout_ms: 500,
        user_agent: "RestockWatcher-Test/1.0".to_string(),
        chrome_path: None,
    }
}

/// Everything a test needs to run the monitor repeatedly against one status file.
pub struct TestHarness {
    pub dir: TempDir,
    pub checker: Arc<ScriptedChecker>,
    pub notifier: Arc<RecordingNotifier>,
    pub products: Vec<ProductConfig>,
}

impl TestHarness {
    pub fn new(products: Vec<ProductConfig>, delivered: bool) -> anyhow::Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
            checker: Arc::new(ScriptedChecker::default()),
            notifier: Arc::new(RecordingNotifier::new(delivered)),
            products,
        })
    }

    pub fn store(&self) -> StatusStore {
        StatusStore::new(self.dir.path().join("status.json"))
    }

    pub fn monitor(&self) -> Monitor {
        let mut registry = CheckerRegistry::new();
        registry.register(self.checker.clone());
        Monitor::new(
            self.products.clone(),
            registry,
            self.notifier.clone(),
            self.store(),
        )
    }
}
