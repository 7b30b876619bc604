//! CSV loader for the reference dataset.
//!
//! Columns are matched by header name (trimmed, ASCII case-insensitive), so the file's column
//! order does not have to follow the record's feature order. Unrecognized columns are ignored.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::{LabeledRecord, ReferenceDataset};
use crate::patient::{
    FEATURE_COUNT, FIELD_SPECS, InvalidRecord, Outcome, PatientRecord, check_value, parse_number,
};

/// Header of the outcome column.
pub const OUTCOME_COLUMN: &str = "Outcome";

#[derive(Debug, Error)]
pub enum DatasetLoadError {
    #[error("Dataset unavailable at {}: {reason}", path.display())]
    DatasetUnavailable {
        path: PathBuf,
        reason: UnavailableReason,
    },
    #[error("Schema mismatch in {}: {problem}", path.display())]
    SchemaMismatch {
        path: PathBuf,
        problem: SchemaProblem,
    },
}

/// Why the dataset file could not be used at all.
#[derive(Debug, Error)]
pub enum UnavailableReason {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file is empty")]
    EmptyFile,
    #[error("no rows after the header")]
    NoRows,
}

/// Structural problem with the dataset contents.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaProblem {
    #[error("missing column `{0}`")]
    MissingColumn(&'static str),
    #[error("column `{0}` appears more than once")]
    DuplicateColumn(String),
    #[error("line {line}: expected {expected} fields, found {found}")]
    RowLength {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("line {line}, column `{column}`: {value:?} is not numeric")]
    NonNumeric {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("line {line}, column `{column}`: {value} is negative")]
    Negative {
        line: u64,
        column: &'static str,
        value: f64,
    },
    #[error("line {line}, column `{column}`: {value} is not a whole number")]
    NotAnInteger {
        line: u64,
        column: &'static str,
        value: f64,
    },
    #[error("line {line}: outcome {value} is not 0 or 1")]
    InvalidOutcome { line: u64, value: String },
    #[error("malformed csv: {0}")]
    Malformed(String),
}

/// Position of each expected column in the file's header.
struct ColumnMap {
    features: [usize; FEATURE_COUNT],
    outcome: usize,
    width: usize,
}

/// Load the reference dataset from a comma-delimited file with a header row.
pub fn load_dataset(path: &Path) -> Result<ReferenceDataset, DatasetLoadError> {
    let bytes = std::fs::read(path).map_err(|err| unavailable(path, err.into()))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(unavailable(path, UnavailableReason::EmptyFile));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());
    let headers = reader
        .headers()
        .map_err(|err| map_csv_error(path, err))?
        .clone();
    let columns = map_columns(&headers).map_err(|problem| schema(path, problem))?;
    debug!(
        "Dataset header has {} columns; outcome at {}",
        columns.width, columns.outcome
    );

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|err| map_csv_error(path, err))?;
        let line = record
            .position()
            .map_or(idx as u64 + 2, |position| position.line());
        let row = parse_row(&record, &columns, line).map_err(|problem| schema(path, problem))?;
        rows.push(row);
    }

    let dataset = ReferenceDataset::from_rows(rows)
        .ok_or_else(|| unavailable(path, UnavailableReason::NoRows))?
        .with_source(path);
    let [negative, positive] = dataset.class_counts();
    info!(
        "Loaded {} reference rows from {} ({} non-diabetic, {} diabetic)",
        dataset.len(),
        path.display(),
        negative,
        positive
    );
    Ok(dataset)
}

fn map_columns(headers: &csv::StringRecord) -> Result<ColumnMap, SchemaProblem> {
    let find = |column: &'static str| -> Result<usize, SchemaProblem> {
        let mut found = None;
        for (idx, header) in headers.iter().enumerate() {
            if header.trim().eq_ignore_ascii_case(column) {
                if found.is_some() {
                    return Err(SchemaProblem::DuplicateColumn(header.trim().to_string()));
                }
                found = Some(idx);
            }
        }
        found.ok_or(SchemaProblem::MissingColumn(column))
    };
    let mut features = [0usize; FEATURE_COUNT];
    for (slot, spec) in features.iter_mut().zip(FIELD_SPECS.iter()) {
        *slot = find(spec.column)?;
    }
    let outcome = find(OUTCOME_COLUMN)?;
    Ok(ColumnMap {
        features,
        outcome,
        width: headers.len(),
    })
}

fn parse_row(
    record: &csv::StringRecord,
    columns: &ColumnMap,
    line: u64,
) -> Result<LabeledRecord, SchemaProblem> {
    if record.len() != columns.width {
        return Err(SchemaProblem::RowLength {
            line,
            expected: columns.width,
            found: record.len(),
        });
    }

    let mut values = [0.0f64; FEATURE_COUNT];
    for (idx, spec) in FIELD_SPECS.iter().enumerate() {
        let raw = record.get(columns.features[idx]).unwrap_or_default();
        let value = parse_number(raw).ok_or_else(|| SchemaProblem::NonNumeric {
            line,
            column: spec.column,
            value: raw.to_string(),
        })?;
        check_value(spec, value).map_err(|err| match err {
            InvalidRecord::NotAnInteger { value, .. } => SchemaProblem::NotAnInteger {
                line,
                column: spec.column,
                value,
            },
            _ => SchemaProblem::Negative {
                line,
                column: spec.column,
                value,
            },
        })?;
        values[idx] = value;
    }

    let raw_outcome = record.get(columns.outcome).unwrap_or_default();
    let outcome = parse_number(raw_outcome)
        .filter(|value| *value == 0.0 || *value == 1.0)
        .and_then(|value| Outcome::from_label(value as u8))
        .ok_or_else(|| SchemaProblem::InvalidOutcome {
            line,
            value: raw_outcome.to_string(),
        })?;

    // Every value was checked above, so this only fails on a broken field table.
    let patient = PatientRecord::from_features(&values)
        .map_err(|err| SchemaProblem::Malformed(err.to_string()))?;
    Ok(LabeledRecord::new(patient, outcome))
}

fn map_csv_error(path: &Path, err: csv::Error) -> DatasetLoadError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(source) => unavailable(path, UnavailableReason::Io(source)),
        _ => schema(path, SchemaProblem::Malformed(message)),
    }
}

fn unavailable(path: &Path, reason: UnavailableReason) -> DatasetLoadError {
    DatasetLoadError::DatasetUnavailable {
        path: path.to_path_buf(),
        reason,
    }
}

fn schema(path: &Path, problem: SchemaProblem) -> DatasetLoadError {
    DatasetLoadError::SchemaMismatch {
        path: path.to_path_buf(),
        problem,
    }
}
