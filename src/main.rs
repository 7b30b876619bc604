//! Command-line front end: assess diabetes risk for one patient.
//!
//! Unspecified measurements take the input form's defaults and every value is clamped to the
//! form's range before it reaches the library.

use std::path::{Path, PathBuf};

use diabetes_risk::config::{self, RiskSettings};
use diabetes_risk::logging;
use diabetes_risk::patient::{FEATURE_COUNT, FEATURE_NAMES, FIELD_SPECS};
use diabetes_risk::{PatientRecord, RiskAssessment, assess};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct CliOptions {
    config_path: Option<PathBuf>,
    dataset_path: Option<PathBuf>,
    split_seed: Option<u64>,
    forest_seed: Option<u64>,
    evaluation_fraction: Option<f64>,
    record_path: Option<PathBuf>,
    fields: Vec<(String, String)>,
    json: bool,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    let settings = resolve_settings(&options)?;
    let mut fields = Vec::new();
    if let Some(path) = &options.record_path {
        fields.extend(read_record_fields(path)?);
    }
    fields.extend(options.fields.iter().cloned());
    let record = build_record(&fields)?;

    let assessment = assess(&settings, &record).map_err(|err| err.to_string())?;
    if options.json {
        let text = serde_json::to_string_pretty(&assessment).map_err(|err| err.to_string())?;
        println!("{text}");
    } else {
        print_report(&assessment);
    }
    Ok(())
}

fn resolve_settings(options: &CliOptions) -> Result<RiskSettings, String> {
    let mut settings = match &options.config_path {
        Some(path) => config::load_settings_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    if let Some(path) = &options.dataset_path {
        settings.dataset_path = path.clone();
    }
    if let Some(seed) = options.split_seed {
        settings.split.seed = seed;
    }
    if let Some(seed) = options.forest_seed {
        settings.forest.seed = Some(seed);
    }
    if let Some(fraction) = options.evaluation_fraction {
        settings.split.evaluation_fraction = fraction;
    }
    settings.validate().map_err(|err| err.to_string())?;
    Ok(settings)
}

/// Read a JSON object of `field: number` pairs. Fields may be omitted.
fn read_record_fields(path: &Path) -> Result<Vec<(String, String)>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("Failed to read record {}: {err}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .map_err(|err| format!("Invalid record JSON {}: {err}", path.display()))?;
    let object = value
        .as_object()
        .ok_or_else(|| format!("Record {} must be a JSON object", path.display()))?;
    object
        .iter()
        .map(|(name, value)| match value {
            serde_json::Value::Number(number) => Ok((name.clone(), number.to_string())),
            other => Err(format!("Field {name} must be a number, got {other}")),
        })
        .collect()
}

/// Start from the form defaults, apply overrides, then clamp into the form's ranges.
fn build_record(fields: &[(String, String)]) -> Result<PatientRecord, String> {
    let mut values: [f64; FEATURE_COUNT] = PatientRecord::default().features();
    for (name, raw) in fields {
        let idx = FEATURE_NAMES
            .iter()
            .position(|known| *known == name.as_str())
            .ok_or_else(|| format!("Unknown field: {name} (expected one of {FEATURE_NAMES:?})"))?;
        let value = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| format!("Invalid value for {name}: {raw}"))?;
        values[idx] = value;
    }
    PatientRecord::from_clamped_features(&values).map_err(|err| err.to_string())
}

fn print_report(assessment: &RiskAssessment) {
    println!("Patient Data:");
    for (spec, value) in FIELD_SPECS.iter().zip(assessment.record.features()) {
        println!("  {:<26} {}", spec.column, value);
    }
    println!();
    println!("Prediction: {}", assessment.outcome.risk_statement());
    println!(
        "Diabetic votes: {:.0}% of trees",
        assessment.diabetic_vote_share * 100.0
    );
    println!(
        "Trained on {} rows, evaluated on {}",
        assessment.training_rows, assessment.evaluation_rows
    );
    println!("Model Accuracy: {:.2}%", assessment.accuracy_percent());
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                options.config_path = Some(PathBuf::from(value));
            }
            "--dataset" => {
                idx += 1;
                let value =
                    args.get(idx).ok_or_else(|| "--dataset requires a value".to_string())?;
                options.dataset_path = Some(PathBuf::from(value));
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                options.split_seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            "--forest-seed" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--forest-seed requires a value".to_string())?;
                options.forest_seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --forest-seed value: {value}"))?,
                );
            }
            "--evaluation-fraction" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--evaluation-fraction requires a value".to_string())?;
                options.evaluation_fraction = Some(
                    value
                        .parse::<f64>()
                        .map_err(|_| format!("Invalid --evaluation-fraction value: {value}"))?,
                );
            }
            "--record" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--record requires a value".to_string())?;
                options.record_path = Some(PathBuf::from(value));
            }
            "--field" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--field requires a value".to_string())?;
                let (name, raw) = value
                    .split_once('=')
                    .ok_or_else(|| format!("--field expects name=value, got {value}"))?;
                options.fields.push((name.trim().to_string(), raw.to_string()));
            }
            "--json" => options.json = true,
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "diabetes-risk",
        "",
        "Usage:",
        "  diabetes-risk [options]",
        "",
        "Options:",
        "  --config <file>              Settings file (default: app config dir).",
        "  --dataset <file.csv>         Reference dataset (overrides config).",
        "  --seed <n>                   Train/evaluation split seed.",
        "  --forest-seed <n>            Forest seed (default: OS entropy).",
        "  --evaluation-fraction <f>    Held-out share, strictly between 0 and 1.",
        "  --record <file.json>         JSON object of patient fields.",
        "  --field <name=value>         Set one field; repeatable, applied after --record.",
        "  --json                       Print the assessment as JSON.",
        "",
        "Fields: pregnancies, glucose, bloodPressure, skinThickness, insulin,",
        "        bodyMassIndex, diabetesPedigreeFunction, age",
    ]
    .join("\n")
}
