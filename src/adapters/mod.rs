//! Adapters layer: Concrete implementations of ports.
//!
//! - `history_csv`: CSV file history store
//! - `memory`: in-memory history store
//! - `model_file`: JSON model artifact load/save
//! - `credentials`: Argon2 credentials file and a static table
//! - `dataset`: labelled training CSV
//! - `report`: single-patient CSV export
//! - `sanitize`: PII and secret filtering for logs

pub mod credentials;
pub mod dataset;
pub mod history_csv;
pub mod memory;
pub mod model_file;
pub mod report;
pub mod sanitize;

pub use credentials::{hash_password, Argon2Credentials, StaticCredentials};
pub use dataset::{load_dataset, Dataset, DatasetError};
pub use history_csv::{CsvHistoryStore, HistoryError};
pub use memory::InMemoryHistoryStore;
pub use model_file::{load_model, save_model};
pub use report::{report_bytes, report_file_name, ReportError, ReportExporter};
