//! TUI module: Terminal User Interface using Ratatui.
//!
//! Screens:
//! - Login
//! - Dashboard with model and session status
//! - Patient data input and prediction result
//! - History browsing and summary chart

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::MedicalTheme;
