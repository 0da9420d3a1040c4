//! Categorical form selections and their numeric codes.
//!
//! Every categorical field of the patient form is a closed enum. The form can
//! only offer `OPTIONS`, so encoding a selection never fails. Parsing a label
//! (e.g. from a history file) is the only fallible direction.

/// Error returned when a label is not part of a field's encoding table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {field} value: {value:?}")]
pub struct EncodingError {
    pub field: &'static str,
    pub value: String,
}

/// A categorical clinical field with a fixed label → code table.
pub trait Categorical: Copy + Eq + Sized + 'static {
    /// Human-readable field name (used in form labels and errors).
    const FIELD: &'static str;

    /// All selectable values, in display order.
    const OPTIONS: &'static [Self];

    /// Label shown to the user and stored in the history file.
    fn label(self) -> &'static str;

    /// Numeric code fed to the model.
    fn code(self) -> u8;

    /// Look up a value by its exact label.
    ///
    /// # Errors
    /// Returns `EncodingError` if the label is not in the table.
    fn from_label(label: &str) -> Result<Self, EncodingError> {
        Self::OPTIONS
            .iter()
            .copied()
            .find(|option| option.label() == label)
            .ok_or_else(|| EncodingError {
                field: Self::FIELD,
                value: label.to_string(),
            })
    }

    /// Position of this value within `OPTIONS`.
    fn index(self) -> usize {
        Self::OPTIONS
            .iter()
            .position(|option| *option == self)
            .unwrap_or(0)
    }
}

/// Declares a categorical enum together with its encoding table.
///
/// Serde goes through the label so history rows stay human-readable.
macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => ($label:literal, $code:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl Categorical for $name {
            const FIELD: &'static str = $field;
            const OPTIONS: &'static [Self] = &[$(Self::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = EncodingError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::from_label(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.label().to_string()
            }
        }

        impl std::str::FromStr for $name {
            type Err = EncodingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_label(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

categorical! {
    /// Biological sex.
    Sex, "Sex" {
        Male => ("Male", 1),
        Female => ("Female", 0),
    }
}

categorical! {
    /// Chest pain type (cp).
    ChestPainType, "Chest Pain Type" {
        TypicalAngina => ("Typical Angina", 0),
        AtypicalAngina => ("Atypical Angina", 1),
        NonAnginalPain => ("Non-anginal Pain", 2),
        Asymptomatic => ("Asymptomatic", 3),
    }
}

categorical! {
    /// Fasting blood sugar above 120 mg/dl (fbs).
    FastingBloodSugar, "Fasting Blood Sugar > 120 mg/dl" {
        Yes => ("Yes", 1),
        No => ("No", 0),
    }
}

categorical! {
    /// Resting electrocardiogram result (restecg).
    RestingEcg, "Resting ECG" {
        Normal => ("Normal", 0),
        StTAbnormality => ("ST-T wave abnormality", 1),
        LeftVentricularHypertrophy => ("Left Ventricular Hypertrophy", 2),
    }
}

categorical! {
    /// Exercise-induced angina (exang).
    ExerciseAngina, "Exercise Induced Angina" {
        Yes => ("Yes", 1),
        No => ("No", 0),
    }
}

categorical! {
    /// Slope of the peak exercise ST segment (slope).
    StSlope, "Slope of peak exercise ST" {
        Upsloping => ("Upsloping", 0),
        Flat => ("Flat", 1),
        Downsloping => ("Downsloping", 2),
    }
}

categorical! {
    /// Number of major vessels coloured by fluoroscopy (ca).
    MajorVessels, "Major Vessels Colored" {
        Zero => ("0", 0),
        One => ("1", 1),
        Two => ("2", 2),
        Three => ("3", 3),
    }
}

categorical! {
    /// Thalassemia category (thal).
    Thalassemia, "Thalassemia" {
        Normal => ("Normal", 1),
        FixedDefect => ("Fixed Defect", 2),
        ReversibleDefect => ("Reversible Defect", 3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_table<C: Categorical + std::fmt::Debug>(expected: &[(&str, u8)]) {
        assert_eq!(C::OPTIONS.len(), expected.len(), "{}", C::FIELD);
        for (option, (label, code)) in C::OPTIONS.iter().zip(expected) {
            assert_eq!(option.label(), *label);
            assert_eq!(option.code(), *code);
        }

        // One entry per label, and every option round-trips through its label.
        let labels: HashSet<_> = C::OPTIONS.iter().map(|o| o.label()).collect();
        assert_eq!(labels.len(), C::OPTIONS.len());
        for option in C::OPTIONS {
            assert_eq!(C::from_label(option.label()).expect("known label"), *option);
        }
    }

    #[test]
    fn test_encoding_tables() {
        assert_table::<Sex>(&[("Male", 1), ("Female", 0)]);
        assert_table::<ChestPainType>(&[
            ("Typical Angina", 0),
            ("Atypical Angina", 1),
            ("Non-anginal Pain", 2),
            ("Asymptomatic", 3),
        ]);
        assert_table::<FastingBloodSugar>(&[("Yes", 1), ("No", 0)]);
        assert_table::<RestingEcg>(&[
            ("Normal", 0),
            ("ST-T wave abnormality", 1),
            ("Left Ventricular Hypertrophy", 2),
        ]);
        assert_table::<ExerciseAngina>(&[("Yes", 1), ("No", 0)]);
        assert_table::<StSlope>(&[("Upsloping", 0), ("Flat", 1), ("Downsloping", 2)]);
        assert_table::<MajorVessels>(&[("0", 0), ("1", 1), ("2", 2), ("3", 3)]);
        assert_table::<Thalassemia>(&[
            ("Normal", 1),
            ("Fixed Defect", 2),
            ("Reversible Defect", 3),
        ]);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(ChestPainType::NonAnginalPain.code(), 2);
            assert_eq!(Thalassemia::ReversibleDefect.code(), 3);
        }
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let err = Sex::from_label("male").expect_err("labels are case-sensitive");
        assert_eq!(err.field, "Sex");
        assert_eq!(err.value, "male");
        assert!("Moderate".parse::<Thalassemia>().is_err());
    }

    #[test]
    fn test_index_matches_options() {
        assert_eq!(StSlope::Downsloping.index(), 2);
        assert_eq!(MajorVessels::Zero.index(), 0);
    }

    #[test]
    fn test_serde_uses_labels() {
        let json = serde_json::to_string(&RestingEcg::StTAbnormality).expect("serialize");
        assert_eq!(json, "\"ST-T wave abnormality\"");
        let back: RestingEcg = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, RestingEcg::StTAbnormality);
        assert!(serde_json::from_str::<RestingEcg>("\"Abnormal\"").is_err());
    }
}
