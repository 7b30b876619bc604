//! Patient records and outcome labels.
//!
//! A [`PatientRecord`] carries the eight clinical measurements the classifier is trained on, in a
//! fixed canonical order. Records can be built from typed fields, from a raw feature vector, or from
//! named `(field, value)` pairs; the latter two are validated structurally and fail with
//! [`InvalidRecord`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of feature values in a patient record.
pub const FEATURE_COUNT: usize = 8;

/// Record field names in canonical feature order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "pregnancies",
    "glucose",
    "bloodPressure",
    "skinThickness",
    "insulin",
    "bodyMassIndex",
    "diabetesPedigreeFunction",
    "age",
];

/// Numeric kind of a record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Non-negative whole number.
    Integer,
    /// Non-negative real number.
    Real,
}

/// Per-field schema entry, including the input form's range and default value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Record field name.
    pub name: &'static str,
    /// Column header in the reference dataset.
    pub column: &'static str,
    pub kind: FieldKind,
    /// Smallest value offered by the input form.
    pub min: f64,
    /// Largest value offered by the input form.
    pub max: f64,
    /// Value pre-filled by the input form.
    pub default: f64,
}

/// Field schema in canonical feature order.
pub const FIELD_SPECS: [FieldSpec; FEATURE_COUNT] = [
    FieldSpec {
        name: "pregnancies",
        column: "Pregnancies",
        kind: FieldKind::Integer,
        min: 0.0,
        max: 17.0,
        default: 3.0,
    },
    FieldSpec {
        name: "glucose",
        column: "Glucose",
        kind: FieldKind::Integer,
        min: 0.0,
        max: 200.0,
        default: 120.0,
    },
    FieldSpec {
        name: "bloodPressure",
        column: "BloodPressure",
        kind: FieldKind::Integer,
        min: 0.0,
        max: 122.0,
        default: 70.0,
    },
    FieldSpec {
        name: "skinThickness",
        column: "SkinThickness",
        kind: FieldKind::Integer,
        min: 0.0,
        max: 100.0,
        default: 20.0,
    },
    FieldSpec {
        name: "insulin",
        column: "Insulin",
        kind: FieldKind::Integer,
        min: 0.0,
        max: 846.0,
        default: 79.0,
    },
    FieldSpec {
        name: "bodyMassIndex",
        column: "BMI",
        kind: FieldKind::Real,
        min: 0.0,
        max: 67.0,
        default: 20.0,
    },
    FieldSpec {
        name: "diabetesPedigreeFunction",
        column: "DiabetesPedigreeFunction",
        kind: FieldKind::Real,
        min: 0.0,
        max: 2.4,
        default: 0.47,
    },
    FieldSpec {
        name: "age",
        column: "Age",
        kind: FieldKind::Integer,
        min: 21.0,
        max: 88.0,
        default: 33.0,
    },
];

/// Structural problems with a caller-supplied record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidRecord {
    #[error("expected {expected} feature values, got {found}")]
    WrongArity { expected: usize, found: usize },
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("field `{0}` given more than once")]
    DuplicateField(String),
    #[error("field `{field}` is not numeric: {value:?}")]
    NonNumeric { field: &'static str, value: String },
    #[error("field `{field}` must be finite and non-negative, got {value}")]
    OutOfDomain { field: &'static str, value: f64 },
    #[error("field `{field}` must be a whole number, got {value}")]
    NotAnInteger { field: &'static str, value: f64 },
}

/// Binary diabetes classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    NonDiabetic = 0,
    Diabetic = 1,
}

impl Outcome {
    /// Both outcomes in label order.
    pub const ALL: [Outcome; 2] = [Outcome::NonDiabetic, Outcome::Diabetic];

    /// Numeric label (`0` or `1`).
    pub fn label(self) -> u8 {
        self as u8
    }

    /// Class index used by confusion matrices.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(Self::NonDiabetic),
            1 => Some(Self::Diabetic),
            _ => None,
        }
    }

    /// Human-readable risk statement shown to the patient.
    pub fn risk_statement(self) -> &'static str {
        match self {
            Self::NonDiabetic => "You are not Diabetic",
            Self::Diabetic => "You are Diabetic",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonDiabetic => write!(f, "non_diabetic"),
            Self::Diabetic => write!(f, "diabetic"),
        }
    }
}

/// Eight clinical measurements for one patient.
///
/// Deserialization goes through [`PatientRecord::from_features`], so a decoded record obeys the
/// same sign and integrality rules as one built from raw values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawPatientRecord")]
pub struct PatientRecord {
    pub pregnancies: u32,
    /// Plasma glucose, mg/dL.
    pub glucose: u32,
    /// Diastolic blood pressure, mm Hg.
    pub blood_pressure: u32,
    /// Triceps skin fold thickness, mm.
    pub skin_thickness: u32,
    /// Two-hour serum insulin, IU/mL.
    pub insulin: u32,
    pub body_mass_index: f64,
    pub diabetes_pedigree_function: f64,
    /// Age in years.
    pub age: u32,
}

/// Wire shape of [`PatientRecord`] before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawPatientRecord {
    pregnancies: f64,
    glucose: f64,
    blood_pressure: f64,
    skin_thickness: f64,
    insulin: f64,
    body_mass_index: f64,
    diabetes_pedigree_function: f64,
    age: f64,
}

impl TryFrom<RawPatientRecord> for PatientRecord {
    type Error = InvalidRecord;

    fn try_from(raw: RawPatientRecord) -> Result<Self, Self::Error> {
        Self::from_features(&[
            raw.pregnancies,
            raw.glucose,
            raw.blood_pressure,
            raw.skin_thickness,
            raw.insulin,
            raw.body_mass_index,
            raw.diabetes_pedigree_function,
            raw.age,
        ])
    }
}

impl Default for PatientRecord {
    /// The record pre-filled by the input form.
    fn default() -> Self {
        let values = FIELD_SPECS.map(|spec| spec.default);
        Self::from_checked(&values)
    }
}

impl PatientRecord {
    /// Feature values in canonical order.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.pregnancies),
            f64::from(self.glucose),
            f64::from(self.blood_pressure),
            f64::from(self.skin_thickness),
            f64::from(self.insulin),
            self.body_mass_index,
            self.diabetes_pedigree_function,
            f64::from(self.age),
        ]
    }

    /// Build a record from a raw feature vector in canonical order.
    pub fn from_features(values: &[f64]) -> Result<Self, InvalidRecord> {
        if values.len() != FEATURE_COUNT {
            return Err(InvalidRecord::WrongArity {
                expected: FEATURE_COUNT,
                found: values.len(),
            });
        }
        for (spec, &value) in FIELD_SPECS.iter().zip(values) {
            check_value(spec, value)?;
        }
        Ok(Self::from_checked(values))
    }

    /// Build a record from named `(field, value)` pairs.
    ///
    /// Every field in [`FEATURE_NAMES`] must appear exactly once; order does not matter. Names are
    /// matched exactly, so a record keyed by another schema is rejected instead of silently
    /// misaligned.
    pub fn from_named_fields<'a, I>(fields: I) -> Result<Self, InvalidRecord>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut parsed: BTreeMap<usize, f64> = BTreeMap::new();
        for (name, raw) in fields {
            let name = name.trim();
            let Some(idx) = FEATURE_NAMES.iter().position(|known| *known == name) else {
                return Err(InvalidRecord::UnknownField(name.to_string()));
            };
            let spec = &FIELD_SPECS[idx];
            let value = parse_number(raw).ok_or_else(|| InvalidRecord::NonNumeric {
                field: spec.name,
                value: raw.to_string(),
            })?;
            check_value(spec, value)?;
            if parsed.insert(idx, value).is_some() {
                return Err(InvalidRecord::DuplicateField(name.to_string()));
            }
        }
        let mut values = [0.0; FEATURE_COUNT];
        for (idx, spec) in FIELD_SPECS.iter().enumerate() {
            values[idx] = *parsed
                .get(&idx)
                .ok_or(InvalidRecord::MissingField(spec.name))?;
        }
        Ok(Self::from_checked(&values))
    }

    /// Build a record from raw values after clamping each into the input form's range.
    ///
    /// Integer fields are rounded to the nearest whole number. Arity and non-finite values are
    /// still rejected.
    pub fn from_clamped_features(values: &[f64]) -> Result<Self, InvalidRecord> {
        if values.len() != FEATURE_COUNT {
            return Err(InvalidRecord::WrongArity {
                expected: FEATURE_COUNT,
                found: values.len(),
            });
        }
        let clamped: Vec<f64> = values
            .iter()
            .zip(FIELD_SPECS.iter())
            .map(|(&value, spec)| {
                let value = value.clamp(spec.min, spec.max);
                match spec.kind {
                    FieldKind::Integer => value.round(),
                    FieldKind::Real => value,
                }
            })
            .collect();
        Self::from_features(&clamped)
    }

    /// Assumes `values` passed [`check_value`] or came from a valid record.
    fn from_checked(values: &[f64]) -> Self {
        Self {
            pregnancies: values[0] as u32,
            glucose: values[1] as u32,
            blood_pressure: values[2] as u32,
            skin_thickness: values[3] as u32,
            insulin: values[4] as u32,
            body_mass_index: values[5],
            diabetes_pedigree_function: values[6],
            age: values[7] as u32,
        }
    }
}

/// Parse a numeric token, rejecting non-finite spellings like `NaN` or `inf`.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let value = raw.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

pub(crate) fn check_value(spec: &FieldSpec, value: f64) -> Result<(), InvalidRecord> {
    if !value.is_finite() || value < 0.0 {
        return Err(InvalidRecord::OutOfDomain {
            field: spec.name,
            value,
        });
    }
    if spec.kind == FieldKind::Integer && (value.fract() != 0.0 || value > f64::from(u32::MAX)) {
        return Err(InvalidRecord::NotAnInteger {
            field: spec.name,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(pairs: &[(&'static str, &'static str)]) -> Result<PatientRecord, InvalidRecord> {
        PatientRecord::from_named_fields(pairs.iter().copied())
    }

    const FULL: [(&str, &str); 8] = [
        ("pregnancies", "3"),
        ("glucose", "120"),
        ("bloodPressure", "70"),
        ("skinThickness", "20"),
        ("insulin", "79"),
        ("bodyMassIndex", "20.0"),
        ("diabetesPedigreeFunction", "0.47"),
        ("age", "33"),
    ];

    #[test]
    fn default_matches_form_defaults() {
        let record = PatientRecord::default();
        assert_eq!(record.pregnancies, 3);
        assert_eq!(record.glucose, 120);
        assert_eq!(record.insulin, 79);
        assert_eq!(record.diabetes_pedigree_function, 0.47);
        assert_eq!(record.age, 33);
    }

    #[test]
    fn named_fields_in_any_order() {
        let mut pairs = FULL.to_vec();
        pairs.reverse();
        let record = named(&pairs).unwrap();
        assert_eq!(record, PatientRecord::default());
    }

    #[test]
    fn seven_fields_is_missing_field() {
        let err = named(&FULL[..7]).unwrap_err();
        assert_eq!(err, InvalidRecord::MissingField("age"));
    }

    #[test]
    fn rejects_unknown_and_duplicate_names() {
        let mut pairs = FULL.to_vec();
        pairs[2] = ("bp", "70");
        assert_eq!(
            named(&pairs).unwrap_err(),
            InvalidRecord::UnknownField("bp".into())
        );

        let mut pairs = FULL.to_vec();
        pairs.push(("glucose", "121"));
        assert_eq!(
            named(&pairs).unwrap_err(),
            InvalidRecord::DuplicateField("glucose".into())
        );
    }

    #[test]
    fn rejects_non_numeric_negative_and_fractional_counts() {
        let mut pairs = FULL.to_vec();
        pairs[1] = ("glucose", "high");
        assert!(matches!(
            named(&pairs),
            Err(InvalidRecord::NonNumeric { field: "glucose", .. })
        ));

        let mut pairs = FULL.to_vec();
        pairs[4] = ("insulin", "-1");
        assert!(matches!(
            named(&pairs),
            Err(InvalidRecord::OutOfDomain { field: "insulin", .. })
        ));

        let mut pairs = FULL.to_vec();
        pairs[0] = ("pregnancies", "1.5");
        assert!(matches!(
            named(&pairs),
            Err(InvalidRecord::NotAnInteger { field: "pregnancies", .. })
        ));

        let mut pairs = FULL.to_vec();
        pairs[5] = ("bodyMassIndex", "NaN");
        assert!(matches!(
            named(&pairs),
            Err(InvalidRecord::NonNumeric { field: "bodyMassIndex", .. })
        ));
    }

    #[test]
    fn from_features_checks_arity() {
        let err = PatientRecord::from_features(&[1.0; 7]).unwrap_err();
        assert_eq!(
            err,
            InvalidRecord::WrongArity {
                expected: 8,
                found: 7
            }
        );
        let record = PatientRecord::default();
        assert_eq!(PatientRecord::from_features(&record.features()).unwrap(), record);
    }

    #[test]
    fn clamps_into_form_ranges() {
        let clamped = PatientRecord::from_clamped_features(&[
            30.0, 250.0, -4.0, 120.0, 80.6, 80.0, 3.1, 12.0,
        ])
        .unwrap();
        assert_eq!(clamped.pregnancies, 17);
        assert_eq!(clamped.glucose, 200);
        assert_eq!(clamped.blood_pressure, 0);
        assert_eq!(clamped.skin_thickness, 100);
        assert_eq!(clamped.insulin, 81);
        assert_eq!(clamped.body_mass_index, 67.0);
        assert_eq!(clamped.diabetes_pedigree_function, 2.4);
        assert_eq!(clamped.age, 21);
    }

    #[test]
    fn clamping_still_rejects_wrong_arity_and_nan() {
        assert!(matches!(
            PatientRecord::from_clamped_features(&[1.0; 7]),
            Err(InvalidRecord::WrongArity { found: 7, .. })
        ));
        let mut values = PatientRecord::default().features();
        values[5] = f64::NAN;
        assert!(matches!(
            PatientRecord::from_clamped_features(&values),
            Err(InvalidRecord::OutOfDomain {
                field: "bodyMassIndex",
                ..
            })
        ));
    }

    #[test]
    fn deserializing_applies_record_checks() {
        let valid = r#"{"pregnancies":3,"glucose":120,"bloodPressure":70,"skinThickness":20,
            "insulin":79,"bodyMassIndex":20.0,"diabetesPedigreeFunction":0.47,"age":33}"#;
        assert_eq!(
            serde_json::from_str::<PatientRecord>(valid).unwrap(),
            PatientRecord::default()
        );

        let negative = valid.replace("\"bodyMassIndex\":20.0", "\"bodyMassIndex\":-25.0");
        let err = serde_json::from_str::<PatientRecord>(&negative).unwrap_err();
        assert!(err.to_string().contains("bodyMassIndex"), "{err}");

        let fractional = valid.replace("\"pregnancies\":3", "\"pregnancies\":1.5");
        assert!(serde_json::from_str::<PatientRecord>(&fractional).is_err());

        let missing = valid.replace("\"age\":33", "\"ages\":33");
        assert!(serde_json::from_str::<PatientRecord>(&missing).is_err());
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let json = serde_json::to_value(PatientRecord::default()).unwrap();
        for name in FEATURE_NAMES {
            assert!(json.get(name).is_some(), "missing {name}");
        }
        let bad = r#"{"pregnancies":3,"glucose":120,"bp":70}"#;
        assert!(serde_json::from_str::<PatientRecord>(bad).is_err());
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(Outcome::from_label(0), Some(Outcome::NonDiabetic));
        assert_eq!(Outcome::from_label(1), Some(Outcome::Diabetic));
        assert_eq!(Outcome::from_label(2), None);
        assert_eq!(Outcome::Diabetic.label(), 1);
        assert_eq!(Outcome::NonDiabetic.risk_statement(), "You are not Diabetic");
    }
}
