use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::config::ScraperConfig;
use crate::models::{snippet, CheckPolicy, CheckResult, ProductConfig};
use crate::plugins::traits::AvailabilityChecker;
use crate::scraper::HttpFetcher;
use crate::utils::error::{AppError, Result};

/// Fetches the page over plain HTTP and looks for availability keywords in
/// the text of one element.
pub struct KeywordChecker {
    fetcher: HttpFetcher,
}

impl KeywordChecker {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        Ok(Self {
            fetcher: HttpFetcher::new(config)?,
        })
    }
}

/// Lower-case `text` and collapse each whitespace run to one space.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Classify a fetched page. The first element matching `selector` is
/// flattened to lower-case text with collapsed whitespace, then searched for
/// each keyword in order.
pub fn classify_keywords(html: &str, selector: &str, keywords: &[String]) -> Result<CheckResult> {
    let css_selector = Selector::parse(selector).map_err(|e| AppError::Parse {
        message: format!("Invalid CSS selector '{}': {:?}", selector, e),
    })?;

    let document = Html::parse_document(html);
    let element = match document.select(&css_selector).next() {
        Some(element) => element,
        None => {
            tracing::info!("Element not found with selector: {}", selector);
            return Ok(CheckResult::unavailable("Element not found"));
        }
    };

    let text = normalize(&element.text().collect::<String>());
    tracing::debug!("Found text: {}...", snippet(&text, 100));

    for keyword in keywords {
        let needle = normalize(keyword);
        if !needle.is_empty() && text.contains(&needle) {
            tracing::info!("Found keyword: {}", keyword);
            return Ok(CheckResult::available(format!("Found: {}", keyword)));
        }
    }

    tracing::info!("No availability keywords found");
    Ok(CheckResult::unavailable(format!(
        "Current status: {}...",
        snippet(&text, 50)
    )))
}

#[async_trait]
impl AvailabilityChecker for KeywordChecker {
    fn policy_type(&self) -> &'static str {
        CheckPolicy::KEYWORD
    }

    async fn check(&self, product: &ProductConfig) -> Result<CheckResult> {
        let (selector, keywords) = match &product.policy {
            CheckPolicy::Keyword { selector, keywords } => (selector, keywords),
            other => {
                return Err(AppError::Validation(format!(
                    "Keyword checker cannot handle '{}' policy",
                    other.policy_type()
                )))
            }
        };

        tracing::info!("Checking: {}", product.url);
        let html = self.fetcher.fetch(&product.url).await?;
        classify_keywords(&html, selector, keywords)
    }
}
