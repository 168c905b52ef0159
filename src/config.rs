use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use url::Url;

use crate::models::{CheckPolicy, ProductConfig};

pub const DEFAULT_CONFIG_PATH: &str = "config/watcher.toml";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub email: EmailConfig,
    pub status: StatusConfig,
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Plain HTTP fetch timeout, seconds.
    pub request_timeout: u64,
    /// Browser navigation and interaction timeout, seconds.
    pub navigation_timeout: u64,
    /// How long to wait for the action control to appear, seconds.
    pub element_wait: u64,
    /// Hover probe timeout, milliseconds.
    pub hover_timeout_ms: u64,
    pub user_agent: String,
    pub chrome_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: Option<String>,
    pub password: Option<String>,
    /// Defaults to `from_address` when unset.
    pub to_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    pub path: PathBuf,
}

impl EmailConfig {
    pub fn recipient(&self) -> Option<&str> {
        self.to_address
            .as_deref()
            .filter(|to| !to.trim().is_empty())
            .or(self.from_address.as_deref())
    }
}

impl AppConfig {
    /// Build configuration from defaults, the optional config file and `RESTOCK__*`
    /// environment variables. The bare `EMAIL_ADDRESS`, `EMAIL_PASSWORD`, `TO_EMAIL`
    /// and `CHROME_PATH` variables fill in whatever is still unset.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path.to_path_buf()).required(true),
            None => File::with_name(DEFAULT_CONFIG_PATH).required(false),
        };

        let s = Config::builder()
            .set_default("scraper.request_timeout", 15_i64)?
            .set_default("scraper.navigation_timeout", 60_i64)?
            .set_default("scraper.element_wait", 30_i64)?
            .set_default("scraper.hover_timeout_ms", 3000_i64)?
            .set_default("scraper.user_agent", DEFAULT_USER_AGENT)?
            .set_default("email.smtp_host", "smtp.gmail.com")?
            .set_default("email.smtp_port", 587_i64)?
            .set_default("status.path", "status.json")?
            .add_source(file)
            .add_source(Environment::with_prefix("RESTOCK").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;
        config.apply_legacy_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_legacy_env(&mut self) {
        let read = |name: &str| {
            env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if self.email.from_address.is_none() {
            self.email.from_address = read("EMAIL_ADDRESS");
        }
        if self.email.password.is_none() {
            // Passwords are taken verbatim; app passwords may carry spaces.
            self.email.password = env::var("EMAIL_PASSWORD").ok().filter(|v| !v.is_empty());
        }
        if self.email.to_address.is_none() {
            self.email.to_address = read("TO_EMAIL");
        }
        if self.scraper.chrome_path.is_none() {
            self.scraper.chrome_path = read("CHROME_PATH");
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.email.smtp_port == 0 {
            return Err(ConfigError::Message("SMTP port must be greater than 0".into()));
        }

        if self.scraper.request_timeout == 0 || self.scraper.navigation_timeout == 0 {
            return Err(ConfigError::Message("Scraper timeouts must be greater than 0".into()));
        }

        if self.scraper.element_wait == 0 || self.scraper.hover_timeout_ms == 0 {
            return Err(ConfigError::Message("Element wait and hover timeout must be greater than 0".into()));
        }

        let mut keys = HashSet::new();
        for product in &self.products {
            if product.name.trim().is_empty() {
                return Err(ConfigError::Message("Product name must not be empty".into()));
            }

            if Url::parse(&product.url).is_err() {
                return Err(ConfigError::Message(format!(
                    "Invalid URL for product '{}': {}",
                    product.name, product.url
                )));
            }

            if product.selector().trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "Product '{}' has an empty selector",
                    product.name
                )));
            }

            if let CheckPolicy::Keyword { keywords, .. } = &product.policy {
                if keywords.iter().all(|k| k.trim().is_empty()) {
                    return Err(ConfigError::Message(format!(
                        "Keyword product '{}' needs at least one keyword",
                        product.name
                    )));
                }
            }

            if !keys.insert(product.status_key()) {
                return Err(ConfigError::Message(format!(
                    "Duplicate product key: {}",
                    product.status_key()
                )));
            }
        }

        Ok(())
    }
}
