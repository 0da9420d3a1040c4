//! Login screen.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::{Zeroize, Zeroizing};

use crate::tui::styles::MedicalTheme;

const MAX_INPUT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

/// Login form state. The password buffer is wiped on drop and on submit.
#[derive(Default)]
pub struct LoginState {
    pub username: String,
    pub password: Zeroizing<String>,
    pub focus: LoginField,
    pub error: Option<String>,
}

impl LoginState {
    /// Fresh form showing why the previous session ended.
    #[must_use]
    pub fn with_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    pub fn input_char(&mut self, c: char) {
        if c.is_control() {
            return;
        }
        let buffer: &mut String = match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut *self.password,
        };
        if buffer.chars().count() < MAX_INPUT {
            buffer.push(c);
        }
        self.error = None;
    }

    pub fn delete_char(&mut self) {
        match self.focus {
            LoginField::Username => {
                self.username.pop();
            }
            LoginField::Password => {
                self.password.pop();
            }
        }
    }

    /// Take the entered credentials, leaving the password field empty.
    pub fn take_credentials(&mut self) -> (String, Zeroizing<String>) {
        let password = Zeroizing::new(self.password.as_str().to_string());
        self.password.zeroize();
        (self.username.trim().to_string(), password)
    }
}

pub fn render_login(f: &mut Frame, area: Rect, state: &LoginState) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Length(14),
            Constraint::Min(0),
        ])
        .split(area);
    let center = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Percentage(40),
            Constraint::Percentage(30),
        ])
        .split(outer[1])[1];

    let block = Block::default()
        .title(Span::styled(" Heart Disease Risk Screening ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());
    let inner = block.inner(center);
    f.render_widget(block, center);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let masked = "•".repeat(state.password.chars().count());
    render_input(f, rows[0], "Username", &state.username, state.focus == LoginField::Username);
    render_input(f, rows[1], "Password", &masked, state.focus == LoginField::Password);

    let status = match &state.error {
        Some(err) => Line::from(Span::styled(format!("! {err}"), MedicalTheme::danger())),
        None => Line::from(vec![
            Span::styled("[Tab] ", MedicalTheme::key_hint()),
            Span::styled("Switch ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Login ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
    };
    f.render_widget(
        Paragraph::new(status).alignment(Alignment::Center),
        rows[2],
    );
}

fn render_input(f: &mut Frame, area: Rect, label: &str, value: &str, focused: bool) {
    let (border, title) = if focused {
        (MedicalTheme::border_focused(), MedicalTheme::focused())
    } else {
        (MedicalTheme::border(), MedicalTheme::text_secondary())
    };
    let cursor = if focused { "▌" } else { "" };
    let input = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(value.to_string(), MedicalTheme::text()),
        Span::styled(cursor, MedicalTheme::cursor()),
    ]))
    .block(
        Block::default()
            .title(Span::styled(format!(" {label} "), title))
            .borders(Borders::ALL)
            .border_style(border),
    );
    f.render_widget(input, area);
}
