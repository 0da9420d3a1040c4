//! Dashboard view: Main overview screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::domain::{HistorySummary, RiskLevel, TrainingMetadata};
use crate::tui::styles::MedicalTheme;

/// Dashboard state for rendering.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub username: String,
    /// Short session token prefix
    pub session_fingerprint: String,
    pub show_fingerprint: bool,
    pub model: TrainingMetadata,
    /// Counts over the most recent history rows
    pub recent: HistorySummary,
    pub recent_window: usize,
    pub history_error: Option<String>,
}

/// Render the main dashboard view.
pub fn render_dashboard(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
        ])
        .split(area);

    render_header(f, chunks[0], state);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    render_status_panels(f, columns[0], state);
    render_recent_summary(f, columns[1], state);
}

fn render_header(f: &mut Frame, area: Rect, state: &DashboardState) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Heartcheck", MedicalTheme::title()),
        Span::styled(" │ ", MedicalTheme::text_muted()),
        Span::styled("Heart Disease Risk Screening", MedicalTheme::text_secondary()),
        Span::styled(" │ signed in as ", MedicalTheme::text_muted()),
        Span::styled(state.username.clone(), MedicalTheme::focused()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_status_panels(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Model status
            Constraint::Length(5), // Accuracy
            Constraint::Min(0),    // Quick actions
        ])
        .margin(1)
        .split(area);

    let model = &state.model;
    let trained_at = if model.trained_at.is_empty() {
        "unknown"
    } else {
        model.trained_at.as_str()
    };
    let digest = &model.dataset_sha256[..model.dataset_sha256.len().min(12)];

    let fingerprint = if state.show_fingerprint {
        Span::styled(state.session_fingerprint.clone(), MedicalTheme::text_muted())
    } else {
        Span::styled("hidden (press [F])", MedicalTheme::text_muted())
    };

    let status_items = vec![
        Line::from(vec![
            Span::styled("  OK ", MedicalTheme::success()),
            Span::styled("Model Loaded", MedicalTheme::text()),
        ]),
        status_line("Trained", trained_at.to_string()),
        status_line("Dataset", format!("{digest}…")),
        status_line(
            "Rows",
            format!("{} train / {} test", model.train_rows, model.test_rows),
        ),
        Line::from(vec![
            Span::styled("  Session: ", MedicalTheme::text_secondary()),
            fingerprint,
        ]),
    ];

    let status_block = Block::default()
        .title(Span::styled(" System Status ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(Paragraph::new(status_items).block(status_block), chunks[0]);

    let accuracy = model.test_accuracy.clamp(0.0, 1.0);
    let accuracy_gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Held-out Accuracy ", MedicalTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::info())
        .ratio(accuracy)
        .label(format!("{:.1}%", accuracy * 100.0));
    f.render_widget(accuracy_gauge, chunks[1]);

    let actions = vec![
        action("N", "New Assessment"),
        action("H", "History"),
        action("S", "Summary"),
        action("F", "Toggle Fingerprint"),
        action("L", "Logout"),
        action("Q", "Quit"),
    ];
    let actions_block = Block::default()
        .title(Span::styled(" Quick Actions ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(Paragraph::new(actions).block(actions_block), chunks[2]);
}

fn status_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label}: "), MedicalTheme::text_secondary()),
        Span::styled(value, MedicalTheme::text()),
    ])
}

fn action(key: &str, desc: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("[{key}] "), MedicalTheme::key_hint()),
        Span::styled(desc.to_string(), MedicalTheme::key_desc()),
    ])
}

fn render_recent_summary(f: &mut Frame, area: Rect, state: &DashboardState) {
    let block = Block::default()
        .title(Span::styled(" Recent Activity ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    if let Some(err) = &state.history_error {
        let msg = Paragraph::new(vec![
            Line::from(Span::styled("! History unavailable", MedicalTheme::danger())),
            Line::from(Span::styled(err.clone(), MedicalTheme::text_muted())),
        ])
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let recent = state.recent;
    if recent.total == 0 {
        let empty_msg = Paragraph::new(Line::from(vec![Span::styled(
            "No assessments yet. Press [N] to start.",
            MedicalTheme::text_muted(),
        )]))
        .block(block);
        f.render_widget(empty_msg, area);
        return;
    }

    let lines = vec![
        Line::from(vec![
            Span::styled("Last ", MedicalTheme::text_secondary()),
            Span::styled(recent.total.to_string(), MedicalTheme::text()),
            Span::styled(
                format!(" of up to {} assessments", state.recent_window),
                MedicalTheme::text_muted(),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Low risk: ", MedicalTheme::text_secondary()),
            Span::styled(
                recent.negative.to_string(),
                MedicalTheme::risk_level(RiskLevel::Low),
            ),
            Span::styled(
                format!(" ({:.1}%)", recent.negative_pct()),
                MedicalTheme::text_muted(),
            ),
        ]),
        Line::from(vec![
            Span::styled("High risk: ", MedicalTheme::text_secondary()),
            Span::styled(
                recent.positive.to_string(),
                MedicalTheme::risk_level(RiskLevel::High),
            ),
            Span::styled(
                format!(" ({:.1}%)", recent.positive_pct()),
                MedicalTheme::text_muted(),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Open [H] History for names and timestamps.",
            MedicalTheme::text_muted(),
        )]),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}
