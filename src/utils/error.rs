use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parsing error: {message}")]
    Parse { message: String },

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Structural failure for {product}: {reason}")]
    Structural { product: String, reason: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Structural failures mean the page layout no longer matches the product
    /// configuration. They abort the whole run instead of marking one product
    /// unavailable.
    pub fn is_structural(&self) -> bool {
        matches!(self, AppError::Structural { .. })
    }

    pub fn structural(product: impl Into<String>, reason: impl ToString) -> Self {
        AppError::Structural {
            product: product.into(),
            reason: reason.to_string(),
        }
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
