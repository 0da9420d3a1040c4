//! Prediction result view.

use std::path::PathBuf;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::application::Assessment;
use crate::domain::RiskLevel;
use crate::tui::styles::MedicalTheme;

/// Contributions listed on screen.
const TOP_FEATURES: usize = 6;

/// Result screen state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    #[default]
    Idle,
    Complete {
        assessment: Assessment,
        exported: Option<PathBuf>,
        export_error: Option<String>,
    },
    Error {
        message: String,
    },
}

/// Render the result screen
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Prediction Result", MedicalTheme::title()),
        Span::styled(" │ Logistic regression", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(header, chunks[0]);

    match state {
        ResultState::Idle => {}
        ResultState::Complete { assessment, .. } => render_assessment(f, chunks[1], assessment),
        ResultState::Error { message } => render_error(f, chunks[1], message),
    }
    render_result_footer(f, chunks[2], state);
}

fn render_assessment(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", assessment.row.name),
            MedicalTheme::subtitle(),
        ))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());
    let inner = block.inner(columns[0]);
    f.render_widget(block, columns[0]);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Risk level
            Constraint::Length(3), // Probability
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let level = assessment.row.risk_level;
    let risk_style = MedicalTheme::risk_level(level);
    let icon = match level {
        RiskLevel::Low => "OK",
        RiskLevel::High => "!",
    };
    let risk_display = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{icon} {level}"),
            risk_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(level.description(), MedicalTheme::text_secondary())),
        Line::from(Span::styled(
            format!("Prediction: {}", assessment.row.prediction),
            MedicalTheme::verdict(assessment.row.prediction),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(risk_display, chunks[0]);

    let p = assessment.prediction.probability;
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Disease Probability ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::probability(p))
        .ratio(p.clamp(0.0, 1.0))
        .label(assessment.row.risk_percent.clone());
    f.render_widget(gauge, chunks[1]);

    render_contributions(f, columns[1], assessment);
}

fn render_contributions(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let block = Block::default()
        .title(Span::styled(" Top Factors ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let top = &assessment.contributions[..assessment.contributions.len().min(TOP_FEATURES)];
    let widest = top
        .iter()
        .map(|c| c.contribution.abs())
        .fold(0.0_f64, f64::max);

    let mut lines = vec![Line::from("")];
    for c in top {
        let bar_len = if widest > 0.0 {
            ((c.contribution.abs() / widest) * 12.0).round() as usize
        } else {
            0
        };
        let sign = if c.contribution > 0.0 { '+' } else { '-' };
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<9}", c.feature), MedicalTheme::text()),
            Span::styled(format!("{:>7} ", c.value), MedicalTheme::text_muted()),
            Span::styled(
                format!("{sign}{:<13}", "█".repeat(bar_len)),
                MedicalTheme::contribution(c.contribution),
            ),
            Span::styled(format!("{:+.3}", c.contribution), MedicalTheme::text_secondary()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " + raises risk, - lowers it (standardized score units)",
        MedicalTheme::text_muted(),
    )));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Error", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect, state: &ResultState) {
    let content = match state {
        ResultState::Complete {
            exported: Some(path),
            ..
        } => Line::from(vec![
            Span::styled("Report saved to ", MedicalTheme::success()),
            Span::styled(path.display().to_string(), MedicalTheme::text()),
            Span::styled("  [Enter] ", MedicalTheme::key_hint()),
            Span::styled("Dashboard", MedicalTheme::key_desc()),
        ]),
        ResultState::Complete {
            export_error: Some(err),
            ..
        } => Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ]),
        ResultState::Complete { .. } => Line::from(vec![
            Span::styled("[E] ", MedicalTheme::key_hint()),
            Span::styled("Export Report ", MedicalTheme::key_desc()),
            Span::styled("[N] ", MedicalTheme::key_hint()),
            Span::styled("New Assessment ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Dashboard", MedicalTheme::key_desc()),
        ]),
        ResultState::Error { .. } => Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Back to Form ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Dashboard", MedicalTheme::key_desc()),
        ]),
        ResultState::Idle => Line::from(""),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
