//! Developer utility to fit the forest on the reference dataset and report held-out metrics.

use std::path::PathBuf;

use diabetes_risk::FittedRiskModel;
use diabetes_risk::config;
use diabetes_risk::dataset::load_dataset;
use diabetes_risk::logging::{self, LogOptions};
use diabetes_risk::patient::Outcome;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    config_path: Option<PathBuf>,
    dataset_path: Option<PathBuf>,
    split_seed: Option<u64>,
    forest_seed: Option<u64>,
    tree_count: Option<usize>,
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let log_options = LogOptions {
        write_file: false,
        ..LogOptions::default()
    };
    if let Err(err) = logging::init_with(log_options) {
        eprintln!("Logging disabled: {err}");
    }

    let mut settings = match &options.config_path {
        Some(path) => config::load_settings_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    if let Some(path) = options.dataset_path {
        settings.dataset_path = path;
    }
    if let Some(seed) = options.split_seed {
        settings.split.seed = seed;
    }
    if let Some(seed) = options.forest_seed {
        settings.forest.seed = Some(seed);
    }
    if let Some(count) = options.tree_count {
        settings.forest.tree_count = count.max(1);
    }

    let dataset = load_dataset(&settings.dataset_path).map_err(|err| err.to_string())?;
    let fitted = FittedRiskModel::fit(&dataset, &settings).map_err(|err| err.to_string())?;
    let report = fitted.evaluation_report().map_err(|err| err.to_string())?;

    println!(
        "rows: {} (training {}, evaluation {})",
        dataset.len(),
        fitted.split.training.len(),
        fitted.split.evaluation.len()
    );
    println!("trees: {}", fitted.model.tree_count());
    println!("accuracy: {:.4}", report.accuracy);
    for stats in &report.per_class {
        println!(
            "class {:>2} {:<13}  precision={:.3}  recall={:.3}  support={}",
            stats.outcome.label(),
            stats.outcome.to_string(),
            stats.precision,
            stats.recall,
            stats.support
        );
    }
    println!("confusion matrix (rows=true, cols=pred):");
    for truth in Outcome::ALL {
        let mut row = String::new();
        for pred in Outcome::ALL {
            row.push_str(&format!("{:6}", report.confusion.get(truth, pred)));
        }
        println!("{row}");
    }
    Ok(())
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
            "--trees" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--trees requires a value".to_string())?;
                options.tree_count = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --trees value: {value}"))?,
                );
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "diabetes-risk-eval",
        "",
        "Usage:",
        "  diabetes-risk-eval [options]",
        "",
        "Options:",
        "  --config <file>        Settings file (default: app config dir).",
        "  --dataset <file.csv>   Reference dataset (overrides config).",
        "  --seed <n>             Train/evaluation split seed.",
        "  --forest-seed <n>      Forest seed (default: OS entropy).",
        "  --trees <n>            Number of trees (default: 100).",
    ]
    .join("\n")
}
