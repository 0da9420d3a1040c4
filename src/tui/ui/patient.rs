//! Patient data input form.
//!
//! Numeric fields take digits only and are range-checked on submit.
//! Categorical fields cycle through their fixed options with ←/→ or Space.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{
    Categorical, ChestPainType, ExerciseAngina, FastingBloodSugar, MajorVessels, PatientRecord,
    RestingEcg, Sex, StSlope, Thalassemia, AGE_RANGE, CHOLESTEROL_RANGE, MAX_HEART_RATE_RANGE,
    RESTING_BP_RANGE, ST_DEPRESSION_RANGE,
};
use crate::tui::styles::MedicalTheme;

const MAX_NAME_LEN: usize = 80;

/// Form fields in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Age,
    Sex,
    ChestPain,
    RestingBp,
    Cholesterol,
    FastingSugar,
    RestEcg,
    MaxHeartRate,
    ExerciseAngina,
    StDepression,
    Slope,
    MajorVessels,
    Thalassemia,
}

pub const FIELDS: [Field; 14] = [
    Field::Name,
    Field::Age,
    Field::Sex,
    Field::ChestPain,
    Field::RestingBp,
    Field::Cholesterol,
    Field::FastingSugar,
    Field::RestEcg,
    Field::MaxHeartRate,
    Field::ExerciseAngina,
    Field::StDepression,
    Field::Slope,
    Field::MajorVessels,
    Field::Thalassemia,
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Text,
    Integer((u32, u32)),
    Decimal((f64, f64)),
    Choice,
}

impl Field {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Patient Name",
            Self::Age => "Age",
            Self::Sex => Sex::FIELD,
            Self::ChestPain => ChestPainType::FIELD,
            Self::RestingBp => "Resting Blood Pressure",
            Self::Cholesterol => "Cholesterol",
            Self::FastingSugar => FastingBloodSugar::FIELD,
            Self::RestEcg => RestingEcg::FIELD,
            Self::MaxHeartRate => "Max Heart Rate",
            Self::ExerciseAngina => ExerciseAngina::FIELD,
            Self::StDepression => "ST Depression",
            Self::Slope => StSlope::FIELD,
            Self::MajorVessels => MajorVessels::FIELD,
            Self::Thalassemia => Thalassemia::FIELD,
        }
    }

    fn kind(self) -> Kind {
        match self {
            Self::Name => Kind::Text,
            Self::Age => Kind::Integer(AGE_RANGE),
            Self::RestingBp => Kind::Integer(RESTING_BP_RANGE),
            Self::Cholesterol => Kind::Integer(CHOLESTEROL_RANGE),
            Self::MaxHeartRate => Kind::Integer(MAX_HEART_RATE_RANGE),
            Self::StDepression => Kind::Decimal(ST_DEPRESSION_RANGE),
            _ => Kind::Choice,
        }
    }

    fn hint(self) -> String {
        match self.kind() {
            Kind::Text => "optional".to_string(),
            Kind::Integer((lo, hi)) => match self {
                Self::Age => format!("years ({lo}-{hi})"),
                Self::MaxHeartRate => format!("bpm ({lo}-{hi})"),
                Self::RestingBp => format!("mm Hg ({lo}-{hi})"),
                _ => format!("mg/dl ({lo}-{hi})"),
            },
            Kind::Decimal((lo, hi)) => format!("mm ({lo:.1}-{hi:.1})"),
            Kind::Choice => "←/→ to change".to_string(),
        }
    }
}

fn cycle<T: Categorical>(value: T, forward: bool) -> T {
    let options = T::OPTIONS;
    let len = options.len();
    let i = value.index();
    let next = if forward { (i + 1) % len } else { (i + len - 1) % len };
    options[next]
}

/// Patient form state.
///
/// Categorical selections live in `choices`; typed fields keep their raw
/// text until submit.
pub struct PatientFormState {
    pub selected: usize,
    pub name: String,
    pub age: String,
    pub resting_bp: String,
    pub cholesterol: String,
    pub max_heart_rate: String,
    pub st_depression: String,
    pub choices: PatientRecord,
    pub error_message: Option<String>,
}

impl Default for PatientFormState {
    fn default() -> Self {
        let defaults = PatientRecord::default();
        Self {
            selected: 0,
            name: String::new(),
            age: defaults.age.to_string(),
            resting_bp: defaults.resting_bp.to_string(),
            cholesterol: defaults.cholesterol.to_string(),
            max_heart_rate: defaults.max_heart_rate.to_string(),
            st_depression: format!("{:.1}", defaults.st_depression),
            choices: defaults,
            error_message: None,
        }
    }
}

impl PatientFormState {
    #[must_use]
    pub fn current(&self) -> Field {
        FIELDS[self.selected]
    }

    pub fn next_field(&mut self) {
        self.selected = (self.selected + 1) % FIELDS.len();
    }

    pub fn prev_field(&mut self) {
        self.selected = (self.selected + FIELDS.len() - 1) % FIELDS.len();
    }

    fn buffer_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Name => Some(&mut self.name),
            Field::Age => Some(&mut self.age),
            Field::RestingBp => Some(&mut self.resting_bp),
            Field::Cholesterol => Some(&mut self.cholesterol),
            Field::MaxHeartRate => Some(&mut self.max_heart_rate),
            Field::StDepression => Some(&mut self.st_depression),
            _ => None,
        }
    }

    /// Text shown for a field.
    #[must_use]
    pub fn display_value(&self, field: Field) -> String {
        let c = &self.choices;
        match field {
            Field::Name => self.name.clone(),
            Field::Age => self.age.clone(),
            Field::RestingBp => self.resting_bp.clone(),
            Field::Cholesterol => self.cholesterol.clone(),
            Field::MaxHeartRate => self.max_heart_rate.clone(),
            Field::StDepression => self.st_depression.clone(),
            Field::Sex => c.sex.label().to_string(),
            Field::ChestPain => c.chest_pain.label().to_string(),
            Field::FastingSugar => c.fasting_sugar.label().to_string(),
            Field::RestEcg => c.rest_ecg.label().to_string(),
            Field::ExerciseAngina => c.exercise_angina.label().to_string(),
            Field::Slope => c.slope.label().to_string(),
            Field::MajorVessels => c.major_vessels.label().to_string(),
            Field::Thalassemia => c.thalassemia.label().to_string(),
        }
    }

    /// Step the selected categorical field. No-op on typed fields.
    pub fn cycle_choice(&mut self, forward: bool) {
        let field = self.current();
        let c = &mut self.choices;
        match field {
            Field::Sex => c.sex = cycle(c.sex, forward),
            Field::ChestPain => c.chest_pain = cycle(c.chest_pain, forward),
            Field::FastingSugar => c.fasting_sugar = cycle(c.fasting_sugar, forward),
            Field::RestEcg => c.rest_ecg = cycle(c.rest_ecg, forward),
            Field::ExerciseAngina => c.exercise_angina = cycle(c.exercise_angina, forward),
            Field::Slope => c.slope = cycle(c.slope, forward),
            Field::MajorVessels => c.major_vessels = cycle(c.major_vessels, forward),
            Field::Thalassemia => c.thalassemia = cycle(c.thalassemia, forward),
            _ => {}
        }
        self.error_message = None;
    }

    /// Add a character to the selected field, if that field accepts it.
    pub fn input_char(&mut self, c: char) {
        let field = self.current();
        let kind = field.kind();
        if kind == Kind::Choice {
            if c == ' ' {
                self.cycle_choice(true);
            }
            return;
        }
        let Some(buffer) = self.buffer_mut(field) else {
            return;
        };
        let accept = match kind {
            Kind::Text => !c.is_control() && buffer.chars().count() < MAX_NAME_LEN,
            Kind::Integer(_) => c.is_ascii_digit() && buffer.len() < 3,
            Kind::Decimal(_) => {
                (c.is_ascii_digit() || (c == '.' && !buffer.contains('.'))) && buffer.len() < 4
            }
            Kind::Choice => false,
        };
        if accept {
            buffer.push(c);
            self.error_message = None;
        }
    }

    pub fn delete_char(&mut self) {
        if let Some(buffer) = self.buffer_mut(self.current()) {
            buffer.pop();
        }
    }

    pub fn clear_field(&mut self) {
        if let Some(buffer) = self.buffer_mut(self.current()) {
            buffer.clear();
        }
    }

    /// Wipe typed buffers and reset the form.
    pub fn clear_sensitive(&mut self) {
        for buffer in [
            &mut self.name,
            &mut self.age,
            &mut self.resting_bp,
            &mut self.cholesterol,
            &mut self.max_heart_rate,
            &mut self.st_depression,
        ] {
            buffer.zeroize();
        }
        *self = Self::default();
    }

    /// Parse and range-check the form into a record.
    ///
    /// # Errors
    /// Returns a message naming the first unusable field.
    pub fn to_record(&self) -> Result<PatientRecord, String> {
        fn integer(field: Field, raw: &str) -> Result<u32, String> {
            let value: u32 = raw
                .trim()
                .parse()
                .map_err(|_| format!("{}: enter a whole number", field.label()))?;
            if let Kind::Integer((lo, hi)) = field.kind() {
                if !(lo..=hi).contains(&value) {
                    return Err(format!("{}: must be between {lo} and {hi}", field.label()));
                }
            }
            Ok(value)
        }

        let age = integer(Field::Age, &self.age)?;
        let resting_bp = integer(Field::RestingBp, &self.resting_bp)?;
        let cholesterol = integer(Field::Cholesterol, &self.cholesterol)?;
        let max_heart_rate = integer(Field::MaxHeartRate, &self.max_heart_rate)?;

        let st_depression: f64 = self
            .st_depression
            .trim()
            .parse()
            .map_err(|_| format!("{}: enter a number", Field::StDepression.label()))?;
        let (lo, hi) = ST_DEPRESSION_RANGE;
        if !(lo..=hi).contains(&st_depression) {
            return Err(format!(
                "{}: must be between {lo:.1} and {hi:.1}",
                Field::StDepression.label()
            ));
        }

        Ok(PatientRecord {
            name: self.name.trim().to_string(),
            age,
            resting_bp,
            cholesterol,
            max_heart_rate,
            st_depression,
            ..self.choices.clone()
        })
    }

    /// Fill in a typical positive case for demos.
    pub fn load_sample_data(&mut self) {
        self.name = "Sample Patient".into();
        self.age = "63".into();
        self.resting_bp = "145".into();
        self.cholesterol = "233".into();
        self.max_heart_rate = "150".into();
        self.st_depression = "2.3".into();
        self.choices = PatientRecord {
            sex: Sex::Male,
            chest_pain: ChestPainType::Asymptomatic,
            fasting_sugar: FastingBloodSugar::Yes,
            rest_ecg: RestingEcg::Normal,
            exercise_angina: ExerciseAngina::No,
            slope: StSlope::Upsloping,
            major_vessels: MajorVessels::Zero,
            thalassemia: Thalassemia::Normal,
            ..PatientRecord::default()
        };
        self.error_message = None;
    }
}

/// Render the patient data input form
pub fn render_patient_form(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Patient Assessment", MedicalTheme::title()),
        Span::styled(" │ 13 clinical measurements", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = FIELDS.len().div_ceil(2);
    render_field_column(f, columns[0], state, 0..mid);
    render_field_column(f, columns[1], state, mid..FIELDS.len());
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    state: &PatientFormState,
    range: std::ops::Range<usize>,
) {
    let constraints: Vec<Constraint> = range
        .clone()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (slot, index) in range.enumerate() {
        let field = FIELDS[index];
        let is_selected = index == state.selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let value = state.display_value(field);
        let mut spans = vec![Span::raw(" ")];
        if value.is_empty() {
            spans.push(Span::styled(field.hint(), MedicalTheme::text_muted()));
        } else if field.kind() == Kind::Choice {
            spans.push(Span::styled("‹ ", MedicalTheme::text_muted()));
            spans.push(Span::styled(value, MedicalTheme::text()));
            spans.push(Span::styled(" ›", MedicalTheme::text_muted()));
        } else {
            spans.push(Span::styled(value, MedicalTheme::text()));
            spans.push(Span::styled(
                format!("  {}", field.hint()),
                MedicalTheme::text_muted(),
            ));
        }
        if is_selected && field.kind() != Kind::Choice {
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        }

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label()), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);
        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[slot]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[←→] ", MedicalTheme::key_hint()),
            Span::styled("Change ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Predict ", MedicalTheme::key_desc()),
            Span::styled("[F2] ", MedicalTheme::key_hint()),
            Span::styled("Sample Data ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Cancel", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
