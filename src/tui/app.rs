//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Session resolution before every privileged action

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::ReportExporter;
use crate::application::{HistoryService, PredictionService, SessionStore};
use crate::domain::{AuthContext, AuthError, HistorySummary, SessionToken, TrainingMetadata};
use crate::ports::{CredentialVerifier, HistoryStore, RiskModel};
use crate::HeartcheckError;

use super::ui::{
    dashboard::{render_dashboard, DashboardState},
    history::{render_history, HistoryState},
    login::{render_login, LoginState},
    patient::{render_patient_form, PatientFormState},
    render_disclaimer,
    result::{render_result, ResultState},
    summary::{render_summary, SummaryState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
    PatientForm,
    Result,
    History,
    Summary,
}

/// Main application state
pub struct App<V, M, H>
where
    V: CredentialVerifier,
    M: RiskModel,
    H: HistoryStore,
    H::Error: Into<HeartcheckError>,
{
    screen: Screen,
    should_quit: bool,

    sessions: SessionStore<V>,
    predictions: PredictionService<M, H>,
    history: HistoryService<H>,
    reports: ReportExporter,
    /// Provenance of the loaded model, shown on the dashboard
    model_info: TrainingMetadata,

    /// Token of the signed-in user; resolved again for each action
    session: Option<SessionToken>,

    login_state: LoginState,
    dashboard_state: DashboardState,
    patient_form_state: PatientFormState,
    result_state: ResultState,
    history_state: HistoryState,
    summary_state: SummaryState,
}

impl<V, M, H> App<V, M, H>
where
    V: CredentialVerifier,
    M: RiskModel,
    H: HistoryStore,
    H::Error: Into<HeartcheckError>,
{
    /// Create the application from pre-built services (composition root is `main`).
    pub fn new(
        sessions: SessionStore<V>,
        predictions: PredictionService<M, H>,
        history: HistoryService<H>,
        reports: ReportExporter,
        model_info: TrainingMetadata,
    ) -> Self {
        Self {
            screen: Screen::Login,
            should_quit: false,
            sessions,
            predictions,
            history,
            reports,
            model_info,
            session: None,
            login_state: LoginState::default(),
            dashboard_state: DashboardState::default(),
            patient_form_state: PatientFormState::default(),
            result_state: ResultState::default(),
            history_state: HistoryState::default(),
            summary_state: SummaryState::default(),
        }
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        if let Some(token) = self.session.take() {
            self.sessions.logout(&token);
        }

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                let content_area = chunks[0];
                match self.screen {
                    Screen::Login => render_login(f, content_area, &self.login_state),
                    Screen::Dashboard => render_dashboard(f, content_area, &self.dashboard_state),
                    Screen::PatientForm => {
                        render_patient_form(f, content_area, &self.patient_form_state)
                    }
                    Screen::Result => render_result(f, content_area, &self.result_state),
                    Screen::History => render_history(
                        f,
                        content_area,
                        &self.history_state,
                        self.history.tail_len(),
                    ),
                    Screen::Summary => render_summary(f, content_area, &self.summary_state),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::PatientForm => self.handle_patient_form_key(key),
            Screen::Result => self.handle_result_key(key),
            Screen::History => self.handle_history_key(key),
            Screen::Summary => self.handle_summary_key(key),
        }
    }

    /// Resolve the current token, falling back to the login screen if it is
    /// missing or no longer valid.
    fn require_session(&mut self) -> Option<AuthContext> {
        let resolved = match &self.session {
            Some(token) => self.sessions.resolve(token),
            None => Err(AuthError::InvalidSession),
        };
        match resolved {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                tracing::warn!("Action rejected: {e}");
                self.end_session(LoginState::with_error(e.to_string()));
                None
            }
        }
    }

    fn end_session(&mut self, login_state: LoginState) {
        if let Some(token) = self.session.take() {
            self.sessions.logout(&token);
        }
        self.patient_form_state.clear_sensitive();
        self.dashboard_state = DashboardState::default();
        self.result_state = ResultState::default();
        self.history_state = HistoryState::default();
        self.summary_state = SummaryState::default();
        self.login_state = login_state;
        self.screen = Screen::Login;
    }

    fn handle_login_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.login_state.toggle_focus();
            }
            KeyCode::Enter => self.submit_login(),
            KeyCode::Backspace => self.login_state.delete_char(),
            KeyCode::Char(c) => self.login_state.input_char(c),
            _ => {}
        }
    }

    fn submit_login(&mut self) {
        let (username, password) = self.login_state.take_credentials();
        if username.is_empty() || password.is_empty() {
            self.login_state.error = Some("Enter a username and password".to_string());
            return;
        }

        match self.sessions.login(&username, &password) {
            Ok(token) => {
                self.session = Some(token);
                self.login_state = LoginState::default();
                self.refresh_dashboard();
                self.screen = Screen::Dashboard;
            }
            Err(e) => {
                self.login_state.error = Some(e.to_string());
            }
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('n') | KeyCode::Char('N') => {
                if self.require_session().is_some() {
                    self.patient_form_state = PatientFormState::default();
                    self.screen = Screen::PatientForm;
                }
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                self.history_state = HistoryState::default();
                self.load_history();
                if self.screen != Screen::Login {
                    self.screen = Screen::History;
                }
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.load_summary();
                if self.screen != Screen::Login {
                    self.screen = Screen::Summary;
                }
            }
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.dashboard_state.show_fingerprint = !self.dashboard_state.show_fingerprint;
            }
            KeyCode::Char('l') | KeyCode::Char('L') => {
                tracing::info!("User signed out");
                self.end_session(LoginState::default());
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_patient_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.patient_form_state.clear_sensitive();
                self.refresh_dashboard();
                if self.screen != Screen::Login {
                    self.screen = Screen::Dashboard;
                }
            }
            KeyCode::Up | KeyCode::BackTab => self.patient_form_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.patient_form_state.next_field(),
            KeyCode::Left => self.patient_form_state.cycle_choice(false),
            KeyCode::Right => self.patient_form_state.cycle_choice(true),
            KeyCode::F(2) => self.patient_form_state.load_sample_data(),
            KeyCode::Char(c) => self.patient_form_state.input_char(c),
            KeyCode::Backspace => self.patient_form_state.delete_char(),
            KeyCode::Delete => self.patient_form_state.clear_field(),
            KeyCode::Enter => self.submit_patient_form(),
            _ => {}
        }
    }

    fn submit_patient_form(&mut self) {
        let record = match self.patient_form_state.to_record() {
            Ok(record) => record,
            Err(e) => {
                self.patient_form_state.error_message = Some(e);
                return;
            }
        };
        let Some(ctx) = self.require_session() else {
            return;
        };

        match self.predictions.assess(&ctx, &record) {
            Ok(assessment) => {
                self.result_state = ResultState::Complete {
                    assessment,
                    exported: None,
                    export_error: None,
                };
                // Clear plaintext buffers from the UI once the row is stored.
                self.patient_form_state.clear_sensitive();
            }
            Err(HeartcheckError::Validation(msg)) => {
                self.patient_form_state.error_message = Some(msg);
                return;
            }
            Err(e) => {
                tracing::error!("Assessment failed: {e}");
                self.result_state = ResultState::Error {
                    message: e.to_string(),
                };
            }
        }
        self.screen = Screen::Result;
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match &self.result_state {
            ResultState::Complete { .. } => match key {
                KeyCode::Char('e') | KeyCode::Char('E') => self.export_report(),
                KeyCode::Char('n') | KeyCode::Char('N') => {
                    if self.require_session().is_some() {
                        self.patient_form_state = PatientFormState::default();
                        self.screen = Screen::PatientForm;
                    }
                }
                KeyCode::Enter | KeyCode::Esc => self.back_to_dashboard(),
                _ => {}
            },
            ResultState::Error { .. } => match key {
                KeyCode::Enter => self.screen = Screen::PatientForm,
                KeyCode::Esc => self.back_to_dashboard(),
                _ => {}
            },
            ResultState::Idle => {
                if matches!(key, KeyCode::Enter | KeyCode::Esc) {
                    self.back_to_dashboard();
                }
            }
        }
    }

    fn export_report(&mut self) {
        if self.require_session().is_none() {
            return;
        }
        if let ResultState::Complete {
            assessment,
            exported,
            export_error,
        } = &mut self.result_state
        {
            match self.reports.export(&assessment.row) {
                Ok(path) => {
                    *exported = Some(path);
                    *export_error = None;
                }
                Err(e) => {
                    tracing::error!("Report export failed: {e}");
                    *exported = None;
                    *export_error = Some(e.to_string());
                }
            }
        }
    }

    fn handle_history_key(&mut self, key: KeyCode) {
        if self.history_state.confirm_clear {
            self.history_state.confirm_clear = false;
            if matches!(key, KeyCode::Char('y') | KeyCode::Char('Y')) {
                self.clear_history();
            }
            return;
        }

        if self.history_state.editing {
            match key {
                KeyCode::Enter => {
                    self.history_state.editing = false;
                    self.history_state.selected = 0;
                    self.load_history();
                }
                KeyCode::Esc => {
                    self.history_state.editing = false;
                    self.history_state.query.clear();
                    self.history_state.selected = 0;
                    self.load_history();
                }
                KeyCode::Backspace => self.history_state.delete_char(),
                KeyCode::Char(c) => self.history_state.input_char(c),
                _ => {}
            }
            return;
        }

        match key {
            KeyCode::Char('/') => self.history_state.start_search(),
            KeyCode::Up => self.history_state.select_prev(),
            KeyCode::Down => self.history_state.select_next(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.load_history(),
            KeyCode::Char('c') | KeyCode::Char('C') => {
                self.history_state.message = None;
                self.history_state.confirm_clear = true;
            }
            KeyCode::Esc => self.back_to_dashboard(),
            _ => {}
        }
    }

    fn handle_summary_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('r') | KeyCode::Char('R') => self.load_summary(),
            KeyCode::Esc | KeyCode::Enter => self.back_to_dashboard(),
            _ => {}
        }
    }

    fn back_to_dashboard(&mut self) {
        self.refresh_dashboard();
        if self.screen != Screen::Login {
            self.screen = Screen::Dashboard;
        }
    }

    fn refresh_dashboard(&mut self) {
        let Some(ctx) = self.require_session() else {
            return;
        };

        let state = &mut self.dashboard_state;
        state.username = ctx.username.clone();
        state.session_fingerprint = ctx.token.fingerprint().to_string();
        state.model = self.model_info.clone();
        state.recent_window = self.history.tail_len();

        // Only counts are kept; rows are dropped right away.
        match self.history.recent(&ctx) {
            Ok(rows) => {
                state.recent = HistorySummary::from_rows(&rows);
                state.history_error = None;
            }
            Err(e) => {
                tracing::error!("Failed to read history: {e}");
                state.recent = HistorySummary::default();
                state.history_error = Some(e.to_string());
            }
        }
    }

    fn load_history(&mut self) {
        let Some(ctx) = self.require_session() else {
            return;
        };

        let query = self.history_state.query.trim().to_string();
        let result = if query.is_empty() {
            self.history.recent(&ctx)
        } else {
            self.history.search(&ctx, &query)
        };
        match result {
            Ok(rows) => self.history_state.set_rows(rows),
            Err(e) => {
                tracing::error!("Failed to read history: {e}");
                self.history_state.set_error(e.to_string());
            }
        }
    }

    fn clear_history(&mut self) {
        let Some(ctx) = self.require_session() else {
            return;
        };

        match self.history.clear(&ctx) {
            Ok(()) => {
                self.history_state.set_rows(Vec::new());
                self.history_state.message = Some("History cleared".to_string());
            }
            Err(e) => {
                tracing::error!("Failed to clear history: {e}");
                self.history_state.set_error(e.to_string());
            }
        }
    }

    fn load_summary(&mut self) {
        let Some(ctx) = self.require_session() else {
            return;
        };

        self.summary_state = match self.history.summary(&ctx) {
            Ok(summary) => SummaryState {
                summary: Some(summary),
                error: None,
            },
            Err(e) => {
                tracing::error!("Failed to summarize history: {e}");
                SummaryState {
                    summary: None,
                    error: Some(e.to_string()),
                }
            }
        };
    }
}
