pub mod checker;
pub mod notifier;

pub use checker::AvailabilityChecker;
pub use notifier::{AvailabilityAlert, Notifier};
