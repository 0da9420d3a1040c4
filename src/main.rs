//! Heartcheck: heart disease risk screening
//!
//! Main entry point for the terminal application.

use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use heartcheck::adapters::sanitize::SanitizingMakeWriter;
use heartcheck::adapters::{load_model, Argon2Credentials, CsvHistoryStore, ReportExporter};
use heartcheck::application::{HistoryService, PredictionService, SessionStore};
use heartcheck::tui::App;
use heartcheck::AppConfig;

fn main() -> Result<()> {
    let config = AppConfig::from_env();

    // Writing logs to the terminal would corrupt the TUI (alternate screen),
    // so an interactive session logs to a file unless told otherwise.
    let interactive = std::io::stdout().is_terminal();
    let (writer, _guard) = if config.log_mode.use_file(interactive) {
        if let Some(parent) = config.log_file.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)
            .with_context(|| format!("opening log file {}", config.log_file.display()))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting Heartcheck...");
    for warning in config.warnings() {
        tracing::warn!("{warning}");
    }

    // A missing or invalid model is fatal: there is nothing useful to show.
    let model = load_model(&config.model_path).with_context(|| {
        format!(
            "loading model from {} (run train_model first)",
            config.model_path.display()
        )
    })?;
    let credentials = Argon2Credentials::load(&config.credentials_file).with_context(|| {
        format!(
            "loading credentials from {} (create entries with hash_password)",
            config.credentials_file.display()
        )
    })?;

    let model_info = model.metadata.clone();

    let history = Arc::new(CsvHistoryStore::new(&config.history_path));
    let predictions = PredictionService::new(Arc::new(model), history.clone());
    let history = HistoryService::new(history, config.history_tail);
    let sessions = SessionStore::new(credentials);
    let reports = ReportExporter::new(&config.report_dir);

    let mut app = App::new(sessions, predictions, history, reports, model_info);
    app.run()?;

    tracing::info!("Heartcheck shutdown complete.");
    Ok(())
}
