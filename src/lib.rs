pub mod config;
pub mod models;
pub mod monitor;
pub mod plugins;
pub mod scraper;
pub mod status_store;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use monitor::{Monitor, RunSummary};
pub use status_store::{StatusMap, StatusStore};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
