//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod history;
mod prediction;
mod session;

pub use history::{HistoryService, DEFAULT_TAIL};
pub use prediction::{Assessment, PredictionService};
pub use session::SessionStore;
