use async_trait::async_trait;
use headless_chrome::browser::tab::element::Element;
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::models::{CheckPolicy, CheckResult, LocationStep, ProductConfig};
use crate::plugins::traits::AvailabilityChecker;
use crate::scraper::BrowserSession;
use crate::utils::error::{AppError, Result};

/// Class tokens stores use to grey out a buy button.
pub const DISABLED_CLASS_TOKENS: &[&str] = &[
    "disabled",
    "is-disabled",
    "btn-disabled",
    "inactive",
    "unavailable",
    "out-of-stock",
    "sold-out",
];

/// Controls rendered below this opacity are treated as greyed out.
pub const OPACITY_THRESHOLD: f64 = 0.5;

/// Read-only view of a located action control.
pub trait ControlProbe {
    /// `disabled` property or `aria-disabled="true"`.
    fn is_disabled(&self) -> Result<bool>;
    fn class_tokens(&self) -> Result<Vec<String>>;
    fn opacity(&self) -> Result<f64>;
    fn pointer_events(&self) -> Result<String>;
    fn hover(&self, timeout: Duration) -> Result<()>;
}

/// Run the disabled checks in order and stop at the first one that fires.
pub fn classify_control(probe: &dyn ControlProbe, hover_timeout: Duration) -> Result<CheckResult> {
    if probe.is_disabled()? {
        return Ok(CheckResult::unavailable("Action control disabled: disabled attribute set"));
    }

    let tokens = probe.class_tokens()?;
    if let Some(token) = tokens
        .iter()
        .find(|t| DISABLED_CLASS_TOKENS.contains(&t.to_ascii_lowercase().as_str()))
    {
        return Ok(CheckResult::unavailable(format!(
            "Action control disabled: class '{}'",
            token
        )));
    }

    let opacity = probe.opacity()?;
    if opacity < OPACITY_THRESHOLD {
        return Ok(CheckResult::unavailable(format!(
            "Action control disabled: opacity {:.2} below {}",
            opacity, OPACITY_THRESHOLD
        )));
    }

    if probe.pointer_events()?.trim().eq_ignore_ascii_case("none") {
        return Ok(CheckResult::unavailable("Action control disabled: pointer-events none"));
    }

    if let Err(e) = probe.hover(hover_timeout) {
        tracing::debug!("Hover probe failed: {}", e);
        return Ok(CheckResult::unavailable("Action control disabled: hover not possible"));
    }

    Ok(CheckResult::available("Action control is clickable"))
}

struct BrowserControl<'a> {
    session: &'a BrowserSession,
    element: Element<'a>,
}

impl BrowserControl<'_> {
    fn eval_string(&self, function: &str) -> Result<String> {
        match self.session.evaluate_on(&self.element, function)? {
            serde_json::Value::String(s) => Ok(s),
            serde_json::Value::Null => Ok(String::new()),
            other => Ok(other.to_string()),
        }
    }
}

impl ControlProbe for BrowserControl<'_> {
    fn is_disabled(&self) -> Result<bool> {
        let value = self.session.evaluate_on(
            &self.element,
            "function() { return this.disabled === true || this.getAttribute('aria-disabled') === 'true'; }",
        )?;
        Ok(value.as_bool().unwrap_or(false))
    }

    fn class_tokens(&self) -> Result<Vec<String>> {
        let classes = self.eval_string("function() { return Array.from(this.classList).join(' '); }")?;
        Ok(classes.split_whitespace().map(str::to_string).collect())
    }

    fn opacity(&self) -> Result<f64> {
        let raw = self.eval_string("function() { return window.getComputedStyle(this).opacity; }")?;
        raw.trim().parse::<f64>().map_err(|_| AppError::Parse {
            message: format!("Unexpected opacity value '{}'", raw),
        })
    }

    fn pointer_events(&self) -> Result<String> {
        self.eval_string("function() { return window.getComputedStyle(this).pointerEvents; }")
    }

    fn hover(&self, timeout: Duration) -> Result<()> {
        self.session.hover(&self.element, timeout)
    }
}

/// The browser steps a clickability check needs, so the failure mapping can
/// be exercised without Chrome.
pub trait PageSession {
    fn navigate(&self, url: &str) -> Result<()>;
    fn apply_location(&self, step: &LocationStep) -> Result<()>;
    /// Wait for the action control and hand back a probe over it.
    fn find_control(&self, selector: &str, timeout: Duration) -> Result<Box<dyn ControlProbe + '_>>;
}

impl PageSession for BrowserSession {
    fn navigate(&self, url: &str) -> Result<()> {
        BrowserSession::navigate(self, url)
    }

    fn apply_location(&self, step: &LocationStep) -> Result<()> {
        BrowserSession::apply_location(self, step)
    }

    fn find_control(&self, selector: &str, timeout: Duration) -> Result<Box<dyn ControlProbe + '_>> {
        let element = self.wait_for(selector, timeout)?;
        Ok(Box::new(BrowserControl {
            session: self,
            element,
        }))
    }
}

/// Renders the page in headless Chrome and inspects the add-to-cart style
/// control. A control that never shows up is a structural failure.
pub struct ClickabilityChecker {
    config: ScraperConfig,
}

impl ClickabilityChecker {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }
}

/// Open a session, reach the action control and classify it. Anything that
/// stops us reaching the control is structural; probe errors are not.
fn check_page<S, F>(
    open: F,
    config: &ScraperConfig,
    product: &ProductConfig,
    selector: &str,
    location: Option<&LocationStep>,
) -> Result<CheckResult>
where
    S: PageSession,
    F: FnOnce() -> Result<S>,
{
    let structural = |e: AppError| AppError::structural(&product.name, e);

    let session = open().map_err(structural)?;
    session.navigate(&product.url).map_err(structural)?;

    if let Some(step) = location {
        session.apply_location(step).map_err(structural)?;
    }

    let control = session
        .find_control(selector, Duration::from_secs(config.element_wait))
        .map_err(|e| {
            AppError::structural(
                &product.name,
                format!("action control never appeared ({})", e),
            )
        })?;
    tracing::debug!("Found action control {}", selector);

    classify_control(control.as_ref(), Duration::from_millis(config.hover_timeout_ms))
}

#[async_trait]
impl AvailabilityChecker for ClickabilityChecker {
    fn policy_type(&self) -> &'static str {
        CheckPolicy::CLICKABILITY
    }

    async fn check(&self, product: &ProductConfig) -> Result<CheckResult> {
        let (selector, location) = match &product.policy {
            CheckPolicy::Clickability { selector, location } => (selector.clone(), location.clone()),
            other => {
                return Err(AppError::Validation(format!(
                    "Clickability checker cannot handle '{}' policy",
                    other.policy_type()
                )))
            }
        };

        tracing::info!("Checking: {}", product.url);
        let config = self.config.clone();
        let product = product.clone();
        let name = product.name.clone();

        // headless_chrome blocks; keep it off the async worker.
        tokio::task::spawn_blocking(move || {
            check_page(
                || BrowserSession::open(&config),
                &config,
                &product,
                &selector,
                location.as_ref(),
            )
        })
        .await
        .map_err(|e| AppError::structural(name, format!("browser check aborted: {}", e)))?
    }
}
