pub mod checkers;
pub mod manager;
pub mod notifiers;
pub mod traits;

pub use manager::CheckerRegistry;
pub use traits::{AvailabilityChecker, Notifier};
