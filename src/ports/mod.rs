//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (model artifact, history
//! file, credential storage).

mod credentials;
mod history;
mod risk_model;

pub use credentials::CredentialVerifier;
pub use history::{last_n, HistoryStore};
pub use risk_model::RiskModel;
