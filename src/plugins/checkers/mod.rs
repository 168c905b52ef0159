// Availability checker implementations
pub mod clickability;
pub mod keyword;

pub use clickability::ClickabilityChecker;
pub use keyword::KeywordChecker;
