//! Runtime configuration from `HEARTCHECK_*` environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `HEARTCHECK_MODEL_PATH` | `models/heart_disease_model.json` |
//! | `HEARTCHECK_HISTORY_PATH` | `prediction_history.csv` |
//! | `HEARTCHECK_CREDENTIALS_FILE` | `credentials.json` |
//! | `HEARTCHECK_REPORT_DIR` | `.` |
//! | `HEARTCHECK_HISTORY_TAIL` | `10` |
//! | `HEARTCHECK_LOG_MODE` | `auto` (`file` when stdout is a TTY) |
//! | `HEARTCHECK_LOG_FILE` | `heartcheck.log` |
//!
//! Settings are read before logging is up, so rejected values are kept in
//! `warnings()` for the caller to log once the subscriber exists.

use std::path::PathBuf;

use crate::application::DEFAULT_TAIL;

pub const DEFAULT_MODEL_PATH: &str = "models/heart_disease_model.json";
pub const DEFAULT_HISTORY_PATH: &str = "prediction_history.csv";
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";
pub const DEFAULT_LOG_FILE: &str = "heartcheck.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when attached to a terminal (the TUI owns it), stdout otherwise
    #[default]
    Auto,
    File,
    Stdout,
}

impl LogMode {
    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::Auto => interactive,
            Self::File => true,
            Self::Stdout => false,
        }
    }
}

impl std::str::FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "file" => Ok(Self::File),
            "stdout" => Ok(Self::Stdout),
            other => Err(format!("unknown log mode {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub history_path: PathBuf,
    pub credentials_file: PathBuf,
    pub report_dir: PathBuf,
    /// Rows shown in the "recent" history view
    pub history_tail: usize,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    warnings: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: DEFAULT_MODEL_PATH.into(),
            history_path: DEFAULT_HISTORY_PATH.into(),
            credentials_file: DEFAULT_CREDENTIALS_FILE.into(),
            report_dir: ".".into(),
            history_tail: DEFAULT_TAIL,
            log_mode: LogMode::Auto,
            log_file: DEFAULT_LOG_FILE.into(),
            warnings: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset or unusable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("HEARTCHECK_MODEL_PATH") {
            config.model_path = v.into();
        }
        if let Some(v) = get("HEARTCHECK_HISTORY_PATH") {
            config.history_path = v.into();
        }
        if let Some(v) = get("HEARTCHECK_CREDENTIALS_FILE") {
            config.credentials_file = v.into();
        }
        if let Some(v) = get("HEARTCHECK_REPORT_DIR") {
            config.report_dir = v.into();
        }
        if let Some(v) = get("HEARTCHECK_LOG_FILE") {
            config.log_file = v.into();
        }

        if let Some(v) = get("HEARTCHECK_HISTORY_TAIL") {
            match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.history_tail = n,
                _ => config.warnings.push(format!(
                    "HEARTCHECK_HISTORY_TAIL={v:?} is not a positive integer; using {DEFAULT_TAIL}"
                )),
            }
        }

        if let Some(v) = get("HEARTCHECK_LOG_MODE") {
            match v.trim().parse::<LogMode>() {
                Ok(mode) => config.log_mode = mode,
                Err(e) => config
                    .warnings
                    .push(format!("HEARTCHECK_LOG_MODE: {e}; using auto")),
            }
        }

        config
    }

    /// Problems found while reading the environment.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(config.history_path, PathBuf::from("prediction_history.csv"));
        assert_eq!(config.report_dir, PathBuf::from("."));
        assert_eq!(config.history_tail, 10);
        assert_eq!(config.log_mode, LogMode::Auto);
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HEARTCHECK_HISTORY_PATH", "/data/history.csv"),
            ("HEARTCHECK_HISTORY_TAIL", "25"),
            ("HEARTCHECK_LOG_MODE", "STDOUT"),
        ]);
        assert_eq!(config.history_path, PathBuf::from("/data/history.csv"));
        assert_eq!(config.history_tail, 25);
        assert_eq!(config.log_mode, LogMode::Stdout);
    }

    #[test]
    fn test_invalid_values_fall_back_with_warning() {
        let config = config_from(&[
            ("HEARTCHECK_HISTORY_TAIL", "ten"),
            ("HEARTCHECK_LOG_MODE", "syslog"),
            ("HEARTCHECK_MODEL_PATH", "   "),
        ]);
        assert_eq!(config.history_tail, DEFAULT_TAIL);
        assert_eq!(config.log_mode, LogMode::Auto);
        assert_eq!(config.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(config.warnings().len(), 2);
    }

    #[test]
    fn test_log_mode_resolution() {
        assert!(LogMode::Auto.use_file(true));
        assert!(!LogMode::Auto.use_file(false));
        assert!(LogMode::File.use_file(false));
        assert!(!LogMode::Stdout.use_file(true));
    }
}
