use serde::{Deserialize, Serialize};

/// One monitored product page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductConfig {
    pub name: String,
    pub url: String,
    /// Fixed status key. Falls back to `"{name}-{url}"` when unset.
    #[serde(default)]
    pub key: Option<String>,
    pub policy: CheckPolicy,
}

/// How availability is decided for a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CheckPolicy {
    /// Plain HTTP fetch, then a case-insensitive keyword search in one element.
    Keyword {
        selector: String,
        keywords: Vec<String>,
    },
    /// Headless browser render, then inspect whether the action control can be clicked.
    Clickability {
        selector: String,
        #[serde(default)]
        location: Option<LocationStep>,
    },
}

/// Postal code entry some stores require before showing the buy button.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationStep {
    /// Control that opens the location widget, if it starts collapsed.
    #[serde(default)]
    pub trigger_selector: Option<String>,
    pub input_selector: String,
    pub value: String,
    /// Confirm button. Enter is pressed in the input when absent.
    #[serde(default)]
    pub submit_selector: Option<String>,
}

impl ProductConfig {
    pub fn status_key(&self) -> String {
        match &self.key {
            Some(key) => key.clone(),
            None => format!("{}-{}", self.name, self.url),
        }
    }

    pub fn policy_type(&self) -> &'static str {
        self.policy.policy_type()
    }

    pub fn selector(&self) -> &str {
        match &self.policy {
            CheckPolicy::Keyword { selector, .. } => selector,
            CheckPolicy::Clickability { selector, .. } => selector,
        }
    }
}

impl CheckPolicy {
    pub const KEYWORD: &'static str = "keyword";
    pub const CLICKABILITY: &'static str = "clickability";

    pub fn policy_type(&self) -> &'static str {
        match self {
            CheckPolicy::Keyword { .. } => Self::KEYWORD,
            CheckPolicy::Clickability { .. } => Self::CLICKABILITY,
        }
    }
}
