//! # Heartcheck
//!
//! Heart disease risk screening from 13 clinical measurements.
//!
//! This crate provides:
//! - A fitted standardize-then-logistic-regression pipeline
//! - An append-only CSV prediction history with search and summary
//! - Credential login with per-action session resolution
//! - Terminal UI for local use
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (patient record, encoding, model, history rows)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (CSV, JSON model file, Argon2 credentials,
//!   training dataset)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven settings
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use config::AppConfig;
pub use domain::{PatientRecord, Prediction, RiskLevel};

/// Result type for Heartcheck operations
pub type Result<T> = std::result::Result<T, HeartcheckError>;

/// Main error type for Heartcheck
#[derive(Debug, thiserror::Error)]
pub enum HeartcheckError {
    #[error("Encoding failed: {0}")]
    Encoding(#[from] domain::EncodingError),

    #[error("Model error: {0}")]
    Model(#[from] domain::ModelError),

    #[error("History error: {0}")]
    History(#[from] adapters::HistoryError),

    #[error("Authentication failed: {0}")]
    Auth(#[from] domain::AuthError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] adapters::DatasetError),

    #[error("Report export failed: {0}")]
    Report(#[from] adapters::ReportError),

    #[error("Invalid patient data: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::convert::Infallible> for HeartcheckError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}
