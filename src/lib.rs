//! Library exports shared by the command-line front ends, benchmarks and tests.
/// Application directory helpers.
pub mod app_dirs;
/// End-to-end risk assessment for one patient.
pub mod assessment;
/// TOML settings.
pub mod config;
/// Reference dataset loading and splitting.
pub mod dataset;
/// Tracing setup for binaries.
pub mod logging;
/// Random forest classifier and evaluation metrics.
pub mod ml;
/// Patient records and outcomes.
pub mod patient;

pub use assessment::{AssessmentError, FittedRiskModel, RiskAssessment, assess};
pub use patient::{InvalidRecord, Outcome, PatientRecord};
