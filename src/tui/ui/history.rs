//! History view: recent rows, name search and clearing.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::domain::{HistoryRow, TIMESTAMP_FORMAT};
use crate::tui::styles::MedicalTheme;

const MAX_QUERY: usize = 64;

#[derive(Debug, Clone, Default)]
pub struct HistoryState {
    pub rows: Vec<HistoryRow>,
    /// Active name filter; empty shows the most recent rows
    pub query: String,
    /// Query box has keyboard focus
    pub editing: bool,
    /// Waiting for [Y] after [C]
    pub confirm_clear: bool,
    pub selected: usize,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl HistoryState {
    pub fn set_rows(&mut self, rows: Vec<HistoryRow>) {
        self.rows = rows;
        self.error = None;
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.rows.clear();
        self.selected = 0;
        self.error = Some(message.into());
    }

    pub fn start_search(&mut self) {
        self.editing = true;
        self.confirm_clear = false;
        self.message = None;
    }

    pub fn input_char(&mut self, c: char) {
        if !c.is_control() && self.query.chars().count() < MAX_QUERY {
            self.query.push(c);
        }
    }

    pub fn delete_char(&mut self) {
        self.query.pop();
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

pub fn render_history(f: &mut Frame, area: Rect, state: &HistoryState, tail: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Search box
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Footer
        ])
        .split(area);

    let subtitle = if state.query.is_empty() {
        format!(" │ Last {tail} predictions")
    } else {
        format!(" │ {} match(es)", state.rows.len())
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Prediction History", MedicalTheme::title()),
        Span::styled(subtitle, MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(header, chunks[0]);

    let (border, title) = if state.editing {
        (MedicalTheme::border_focused(), MedicalTheme::focused())
    } else {
        (MedicalTheme::border(), MedicalTheme::text_secondary())
    };
    let cursor = if state.editing { "▌" } else { "" };
    let search = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(state.query.clone(), MedicalTheme::text()),
        Span::styled(cursor, MedicalTheme::cursor()),
    ]))
    .block(
        Block::default()
            .title(Span::styled(" Search by name ", title))
            .borders(Borders::ALL)
            .border_style(border),
    );
    f.render_widget(search, chunks[1]);

    if let Some(err) = &state.error {
        let content = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("! Cannot Read History", MedicalTheme::danger())),
            Line::from(""),
            Line::from(Span::styled(err.clone(), MedicalTheme::text())),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::danger()),
        );
        f.render_widget(content, chunks[2]);
    } else {
        render_table(f, chunks[2], state);
    }

    render_history_footer(f, chunks[3], state);
}

fn render_table(f: &mut Frame, area: Rect, state: &HistoryState) {
    let header = Row::new(
        ["Timestamp", "Name", "Age", "Sex", "BP", "Chol", "Prediction", "Risk", "Prob"]
            .into_iter()
            .map(Cell::from),
    )
    .style(MedicalTheme::header());

    let rows = state.rows.iter().map(|r| {
        Row::new(vec![
            Cell::from(r.timestamp.format(TIMESTAMP_FORMAT).to_string()),
            Cell::from(r.name.clone()),
            Cell::from(r.age.to_string()),
            Cell::from(r.sex.to_string()),
            Cell::from(r.resting_bp.to_string()),
            Cell::from(r.cholesterol.to_string()),
            Cell::from(Span::styled(
                r.prediction.to_string(),
                MedicalTheme::verdict(r.prediction),
            )),
            Cell::from(Span::styled(
                r.risk_level.to_string(),
                MedicalTheme::risk_level(r.risk_level),
            )),
            Cell::from(r.risk_percent.clone()),
        ])
        .style(MedicalTheme::text())
    });

    let widths = [
        Constraint::Length(19),
        Constraint::Min(12),
        Constraint::Length(4),
        Constraint::Length(7),
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(7),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .row_highlight_style(MedicalTheme::selected())
        .column_spacing(1);

    let mut table_state = TableState::default();
    if !state.rows.is_empty() {
        table_state.select(Some(state.selected));
    }
    f.render_stateful_widget(table, area, &mut table_state);
}

fn render_history_footer(f: &mut Frame, area: Rect, state: &HistoryState) {
    let content = if state.confirm_clear {
        Line::from(vec![
            Span::styled("Delete the entire history? ", MedicalTheme::warning()),
            Span::styled("[Y] ", MedicalTheme::key_hint()),
            Span::styled("Confirm ", MedicalTheme::key_desc()),
            Span::styled("[any other key] ", MedicalTheme::key_hint()),
            Span::styled("Cancel", MedicalTheme::key_desc()),
        ])
    } else if state.editing {
        Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Apply ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Clear Search", MedicalTheme::key_desc()),
        ])
    } else if let Some(msg) = &state.message {
        Line::from(Span::styled(msg.clone(), MedicalTheme::success()))
    } else {
        Line::from(vec![
            Span::styled("[/] ", MedicalTheme::key_hint()),
            Span::styled("Search ", MedicalTheme::key_desc()),
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Scroll ", MedicalTheme::key_desc()),
            Span::styled("[R] ", MedicalTheme::key_hint()),
            Span::styled("Refresh ", MedicalTheme::key_desc()),
            Span::styled("[C] ", MedicalTheme::key_hint()),
            Span::styled("Clear History ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Back", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PatientRecord, Prediction};
    use chrono::NaiveDate;

    fn rows(n: usize) -> Vec<HistoryRow> {
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("valid timestamp");
        (0..n)
            .map(|i| {
                let record = PatientRecord {
                    name: format!("Patient {i}"),
                    ..PatientRecord::default()
                };
                HistoryRow::new(&record, &Prediction::from_probability(0.2), at)
            })
            .collect()
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let mut state = HistoryState::default();
        state.set_rows(rows(3));
        for _ in 0..5 {
            state.select_next();
        }
        assert_eq!(state.selected, 2);

        state.set_rows(rows(1));
        assert_eq!(state.selected, 0);
        state.select_prev();
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn test_error_drops_rows() {
        let mut state = HistoryState::default();
        state.set_rows(rows(2));
        state.set_error("parse error at line 3");
        assert!(state.rows.is_empty());
        assert!(state.error.is_some());

        state.set_rows(rows(2));
        assert!(state.error.is_none());
    }

    #[test]
    fn test_query_editing() {
        let mut state = HistoryState::default();
        state.start_search();
        for c in "lice".chars() {
            state.input_char(c);
        }
        state.input_char('\n');
        state.delete_char();
        assert_eq!(state.query, "lic");
        assert!(state.editing);
    }
}
