pub mod check_result;
pub mod product;

// Re-exports for convenience
pub use check_result::*;
pub use product::*;
