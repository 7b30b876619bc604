mod support;

use diabetes_risk::config::{self, RiskSettings};
use diabetes_risk::dataset::{DatasetLoadError, SchemaProblem, load_dataset};
use diabetes_risk::patient::{FEATURE_NAMES, InvalidRecord};
use diabetes_risk::{AssessmentError, FittedRiskModel, Outcome, PatientRecord, assess};
use support::pima::{synthetic_csv, write_synthetic_csv};
use tempfile::tempdir;

fn settings_for(path: std::path::PathBuf) -> RiskSettings {
    let mut settings = RiskSettings {
        dataset_path: path,
        ..RiskSettings::default()
    };
    settings.forest.tree_count = 25;
    settings.forest.seed = Some(11);
    settings
}

#[test]
fn full_size_dataset_splits_614_154() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("diabetes.csv");
    write_synthetic_csv(&path, 768, 1);

    let settings = settings_for(path);
    let assessment = assess(&settings, &PatientRecord::default()).unwrap();
    assert_eq!(assessment.training_rows, 614);
    assert_eq!(assessment.evaluation_rows, 154);
    assert!((0.0..=1.0).contains(&assessment.accuracy));
    assert!(Outcome::ALL.contains(&assessment.outcome));
}

#[test]
fn default_record_predicts_deterministically_for_a_fitted_model() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("diabetes.csv");
    write_synthetic_csv(&path, 300, 2);
    let dataset = load_dataset(&path).unwrap();
    let settings = settings_for(path);

    let fitted = FittedRiskModel::fit(&dataset, &settings).unwrap();
    let record = PatientRecord {
        pregnancies: 3,
        glucose: 120,
        blood_pressure: 70,
        skin_thickness: 20,
        insulin: 79,
        body_mass_index: 20.0,
        diabetes_pedigree_function: 0.47,
        age: 33,
    };
    assert_eq!(record, PatientRecord::default());
    let first = fitted.predict(&record);
    for _ in 0..10 {
        assert_eq!(fitted.predict(&record), first);
    }

    let refit = FittedRiskModel::fit(&dataset, &settings).unwrap();
    assert_eq!(refit.predict(&record), first);
    assert_eq!(refit.accuracy().unwrap(), fitted.accuracy().unwrap());
}

#[test]
fn seven_field_record_is_rejected_and_model_stays_usable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("diabetes.csv");
    write_synthetic_csv(&path, 200, 3);
    let dataset = load_dataset(&path).unwrap();
    let fitted = FittedRiskModel::fit(&dataset, &settings_for(path)).unwrap();

    let values = PatientRecord::default().features();
    assert_eq!(
        fitted.model.predict_features(&values[..7]),
        Err(InvalidRecord::WrongArity {
            expected: 8,
            found: 7
        })
    );

    let raw: Vec<String> = values.iter().map(|value| value.to_string()).collect();
    let named: Vec<(&str, &str)> = FEATURE_NAMES
        .iter()
        .zip(&raw)
        .take(7)
        .map(|(name, value)| (*name, value.as_str()))
        .collect();
    assert_eq!(
        fitted.model.predict_named(named.clone()),
        Err(InvalidRecord::MissingField("age"))
    );

    let mut full = named;
    full.push(("age", "33"));
    let outcome = fitted.model.predict_named(full).unwrap();
    assert_eq!(outcome, fitted.predict(&PatientRecord::default()));
    assert!((0.0..=1.0).contains(&fitted.accuracy().unwrap()));
}

#[test]
fn evaluation_report_agrees_with_accuracy() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("diabetes.csv");
    write_synthetic_csv(&path, 250, 4);
    let dataset = load_dataset(&path).unwrap();
    let fitted = FittedRiskModel::fit(&dataset, &settings_for(path)).unwrap();

    let report = fitted.evaluation_report().unwrap();
    assert_eq!(report.accuracy, fitted.accuracy().unwrap());
    assert_eq!(report.confusion.total(), 50);
    let support: u32 = report.per_class.iter().map(|stats| stats.support).sum();
    assert_eq!(support, 50);
}

#[test]
fn settings_file_drives_the_pipeline() {
    let dir = tempdir().unwrap();
    let data_path = dir.path().join("data").join("pima.csv");
    write_synthetic_csv(&data_path, 120, 5);
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "dataset_path = '{}'\n\n[split]\nevaluation_fraction = 0.25\nseed = 3\n\n[forest]\ntree_count = 10\nmax_depth = 4\nseed = 8\n",
            data_path.display()
        ),
    )
    .unwrap();

    let settings = config::load_settings_from(&config_path).unwrap();
    let assessment = assess(&settings, &PatientRecord::default()).unwrap();
    assert_eq!(assessment.evaluation_rows, 30);
    assert_eq!(assessment.training_rows, 90);

    let json = serde_json::to_value(&assessment).unwrap();
    assert!(json.get("outcome").is_some());
    assert_eq!(json["evaluation_rows"], 30);
    assert_eq!(json["record"]["glucose"], 120);
}

#[test]
fn reordered_columns_with_extras_load_like_the_canonical_layout() {
    let dir = tempdir().unwrap();
    let canonical = synthetic_csv(40, 6);
    let canonical_path = dir.path().join("canonical.csv");
    std::fs::write(&canonical_path, &canonical).unwrap();

    let mut reordered = String::from("Outcome,Age,id,BMI,Glucose,Pregnancies,BloodPressure,SkinThickness,Insulin,DiabetesPedigreeFunction\n");
    for (idx, line) in canonical.lines().skip(1).enumerate() {
        let cols: Vec<&str> = line.split(',').collect();
        reordered.push_str(&format!(
            "{},{},{idx},{},{},{},{},{},{},{}\n",
            cols[8], cols[7], cols[5], cols[1], cols[0], cols[2], cols[3], cols[4], cols[6]
        ));
    }
    let reordered_path = dir.path().join("reordered.csv");
    std::fs::write(&reordered_path, reordered).unwrap();

    let a = load_dataset(&canonical_path).unwrap();
    let b = load_dataset(&reordered_path).unwrap();
    assert_eq!(a.rows(), b.rows());
}

#[test]
fn schema_problems_surface_through_assess() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.csv");
    std::fs::write(
        &path,
        "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age\n1,100,70,20,80,30.0,0.5,40\n",
    )
    .unwrap();

    let err = assess(&settings_for(path), &PatientRecord::default()).unwrap_err();
    match err {
        AssessmentError::Dataset(DatasetLoadError::SchemaMismatch { problem, .. }) => {
            assert_eq!(problem, SchemaProblem::MissingColumn("Outcome"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
