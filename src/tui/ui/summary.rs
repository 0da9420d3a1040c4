//! Summary view: Yes/No counts over the whole history.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use crate::domain::{HistorySummary, Verdict};
use crate::tui::styles::MedicalTheme;

#[derive(Debug, Clone, Default)]
pub struct SummaryState {
    pub summary: Option<HistorySummary>,
    pub error: Option<String>,
}

pub fn render_summary(f: &mut Frame, area: Rect, state: &SummaryState) {
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
        Span::styled("Summary", MedicalTheme::title()),
        Span::styled(" │ All recorded predictions", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(header, chunks[0]);

    match (&state.error, state.summary) {
        (Some(err), _) => render_summary_error(f, chunks[1], err),
        (None, Some(summary)) if summary.total > 0 => render_chart(f, chunks[1], summary),
        _ => {
            let empty = Paragraph::new(Line::from(Span::styled(
                "No predictions recorded yet.",
                MedicalTheme::text_muted(),
            )))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(MedicalTheme::border()),
            );
            f.render_widget(empty, chunks[1]);
        }
    }

    let footer = Paragraph::new(Line::from(vec![
        Span::styled("[R] ", MedicalTheme::key_hint()),
        Span::styled("Refresh ", MedicalTheme::key_desc()),
        Span::styled("[Esc] ", MedicalTheme::key_hint()),
        Span::styled("Back", MedicalTheme::key_desc()),
    ]))
    .block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(footer, chunks[2]);
}

fn render_chart(f: &mut Frame, area: Rect, summary: HistorySummary) {
    let bars = [
        verdict_bar(Verdict::Yes, summary.positive, summary.positive_pct()),
        verdict_bar(Verdict::No, summary.negative, summary.negative_pct()),
    ];

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" Predictions ({} total) ", summary.total),
                    MedicalTheme::subtitle(),
                ))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(12)
        .bar_gap(6)
        .max(summary.total as u64);

    f.render_widget(chart, area);
}

fn verdict_bar(verdict: Verdict, count: usize, pct: f64) -> Bar<'static> {
    let style = MedicalTheme::verdict(verdict);
    Bar::default()
        .value(count as u64)
        .label(Line::from(verdict.to_string()))
        .text_value(format!("{count} ({pct:.1}%)"))
        .style(style)
        .value_style(MedicalTheme::selected())
}

fn render_summary_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Cannot Load History", MedicalTheme::danger())),
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
