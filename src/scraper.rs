use headless_chrome::browser::tab::element::Element;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::models::LocationStep;
use crate::utils::error::{AppError, Result};

/// Plain HTTP page fetcher used by the keyword policy.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self { client })
    }

    /// Fetch the page body. Non-success status codes are errors.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        tracing::debug!("Fetching {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// A headless browser with a single tab. The tab is closed when the session
/// is dropped and the browser process goes down with it.
pub struct BrowserSession {
    // Field order matters: the tab must drop before the browser.
    tab: Arc<Tab>,
    _browser: Browser,
}

impl BrowserSession {
    pub fn open(config: &ScraperConfig) -> Result<Self> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false) // Often needed in containerized environments
            .idle_browser_timeout(Duration::from_secs(config.navigation_timeout * 2))
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
            ])
            .build()
            .map_err(|e| AppError::Browser(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(std::path::PathBuf::from(chrome_path));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| AppError::Browser(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| AppError::Browser(format!("Failed to create tab: {}", e)))?;

        tab.set_default_timeout(Duration::from_secs(config.navigation_timeout));
        tab.set_user_agent(&config.user_agent, None, None)
            .map_err(|e| AppError::Browser(format!("Failed to set user agent: {}", e)))?;

        Ok(Self {
            tab,
            _browser: browser,
        })
    }

    pub fn navigate(&self, url: &str) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        self.tab
            .navigate_to(url)
            .map_err(|e| AppError::Browser(format!("Navigation failed: {}", e)))?
            .wait_until_navigated()
            .map_err(|e| AppError::Browser(format!("Page load failed: {}", e)))?;
        Ok(())
    }

    /// Fill in the postal code widget so the store shows stock for that region.
    pub fn apply_location(&self, step: &LocationStep) -> Result<()> {
        if let Some(trigger) = &step.trigger_selector {
            self.tab
                .wait_for_element(trigger)
                .and_then(|el| el.click().map(|_| ()))
                .map_err(|e| AppError::Browser(format!("Location trigger '{}' failed: {}", trigger, e)))?;
        }

        let input = self
            .tab
            .wait_for_element(&step.input_selector)
            .map_err(|e| AppError::Browser(format!("Location input '{}' failed: {}", step.input_selector, e)))?;
        input
            .click()
            .and_then(|el| el.type_into(&step.value))
            .map_err(|e| AppError::Browser(format!("Typing location failed: {}", e)))?;

        match &step.submit_selector {
            Some(submit) => {
                self.tab
                    .wait_for_element(submit)
                    .and_then(|el| el.click().map(|_| ()))
                    .map_err(|e| AppError::Browser(format!("Location submit '{}' failed: {}", submit, e)))?;
            }
            None => {
                self.tab
                    .press_key("Enter")
                    .map_err(|e| AppError::Browser(format!("Submitting location failed: {}", e)))?;
            }
        }

        // A location change usually triggers a reload or an XHR refresh of the buy box.
        if let Err(e) = self.tab.wait_until_navigated() {
            tracing::debug!("No navigation after location change: {}", e);
        }
        tracing::debug!("Applied location {}", step.value);
        Ok(())
    }

    /// Wait up to `timeout` for `selector`. Expiry is reported as
    /// `ElementNotFound` so callers can tell it apart from navigation errors.
    pub fn wait_for(&self, selector: &str, timeout: Duration) -> Result<Element<'_>> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map_err(|_| AppError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    /// Run a JS function with the element bound to `this` and return its
    /// primitive result.
    pub fn evaluate_on(&self, element: &Element<'_>, function: &str) -> Result<serde_json::Value> {
        let remote = element
            .call_js_fn(function, vec![], false)
            .map_err(|e| AppError::Browser(format!("Script evaluation failed: {}", e)))?;
        Ok(remote.value.unwrap_or(serde_json::Value::Null))
    }

    /// Move the mouse over `element`, giving up after `timeout`.
    pub fn hover(&self, element: &Element<'_>, timeout: Duration) -> Result<()> {
        let tab = Arc::clone(&self.tab);
        let node_id = element.node_id;
        with_deadline("Hover", timeout, move || {
            let element = Element::new(&tab, node_id)
                .map_err(|e| AppError::Browser(format!("Hover target lost: {}", e)))?;
            element
                .move_mouse_over()
                .map_err(|e| AppError::Browser(format!("Hover failed: {}", e)))?;
            Ok(())
        })
    }
}

/// Run `work` on its own thread and stop waiting once `timeout` has passed.
/// headless_chrome calls carry their own fixed waits; this caps them. A worker
/// that overruns is abandoned and its result discarded.
pub fn with_deadline<T, F>(operation: &str, timeout: Duration, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(work());
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(AppError::Browser(format!(
            "{} timed out after {} ms",
            operation,
            timeout.as_millis()
        ))),
        Err(RecvTimeoutError::Disconnected) => {
            Err(AppError::Browser(format!("{} worker exited without a result", operation)))
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(true) {
            tracing::debug!("Failed to close browser tab: {}", e);
        }
    }
}
