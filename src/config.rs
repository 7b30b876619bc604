//! TOML settings for the assessment pipeline.
//!
//! Settings live in `config.toml` inside the app directory. A missing file yields defaults, and
//! every key is optional so older or partial files keep loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::app_dirs::{AppDirError, AppDirs};
use crate::dataset::{DEFAULT_EVALUATION_FRACTION, DEFAULT_SPLIT_SEED};
use crate::ml::forest::{MaxFeatures, TrainOptions};

/// Default filename used to store the settings.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Reference dataset used when no path is configured.
pub const DEFAULT_DATASET_FILE: &str = "diabetes.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not resolve the config directory: {0}")]
    AppDir(#[from] AppDirError),
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {}: {source}", path.display())]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid setting `{key}`: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Everything one assessment needs besides the patient record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSettings {
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,
    #[serde(default)]
    pub split: SplitSettings,
    #[serde(default)]
    pub forest: ForestSettings,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            split: SplitSettings::default(),
            forest: ForestSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitSettings {
    /// Share of rows held out for accuracy measurement.
    #[serde(default = "default_evaluation_fraction")]
    pub evaluation_fraction: f64,
    #[serde(default = "default_split_seed")]
    pub seed: u64,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            evaluation_fraction: default_evaluation_fraction(),
            seed: default_split_seed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestSettings {
    #[serde(default = "default_tree_count")]
    pub tree_count: usize,
    /// `0` means unlimited.
    #[serde(default)]
    pub max_depth: usize,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    #[serde(default)]
    pub max_features: MaxFeaturesSetting,
    #[serde(default = "default_true")]
    pub bootstrap: bool,
    /// Unset seeds the forest from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ForestSettings {
    fn default() -> Self {
        Self {
            tree_count: default_tree_count(),
            max_depth: 0,
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            max_features: MaxFeaturesSetting::default(),
            bootstrap: true,
            seed: None,
        }
    }
}

/// `max_features` as written in TOML: a rule name or a fixed count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxFeaturesSetting {
    Count(usize),
    Rule(String),
}

impl Default for MaxFeaturesSetting {
    fn default() -> Self {
        Self::Rule("sqrt".to_string())
    }
}

impl MaxFeaturesSetting {
    pub fn resolve(&self) -> Result<MaxFeatures, ConfigError> {
        match self {
            Self::Count(n) => Ok(MaxFeatures::Count(*n)),
            Self::Rule(rule) => match rule.trim().to_ascii_lowercase().as_str() {
                "sqrt" => Ok(MaxFeatures::Sqrt),
                "log2" => Ok(MaxFeatures::Log2),
                "all" => Ok(MaxFeatures::All),
                other => Err(ConfigError::Invalid {
                    key: "forest.max_features",
                    message: format!("expected sqrt, log2, all or a count, got {other:?}"),
                }),
            },
        }
    }
}

impl ForestSettings {
    /// Convert to trainer options.
    pub fn train_options(&self) -> Result<TrainOptions, ConfigError> {
        Ok(TrainOptions {
            tree_count: self.tree_count,
            max_depth: (self.max_depth > 0).then_some(self.max_depth),
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features.resolve()?,
            bootstrap: self.bootstrap,
            seed: self.seed,
        })
    }
}

impl RiskSettings {
    /// Clamp counts into their usable ranges.
    pub fn normalized(mut self) -> Self {
        self.forest.tree_count = self.forest.tree_count.max(1);
        self.forest.min_samples_split = self.forest.min_samples_split.max(2);
        self.forest.min_samples_leaf = self.forest.min_samples_leaf.max(1);
        self
    }

    /// Reject settings that cannot be normalized into something usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fraction = self.split.evaluation_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(ConfigError::Invalid {
                key: "split.evaluation_fraction",
                message: format!("must be strictly between 0 and 1, got {fraction}"),
            });
        }
        if self.dataset_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                key: "dataset_path",
                message: "must not be empty".to_string(),
            });
        }
        self.forest.max_features.resolve().map(|_| ())
    }
}

/// Resolve the settings file path, ensuring the app directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    config_path_in(&AppDirs::resolve()?)
}

pub fn config_path_in(dirs: &AppDirs) -> Result<PathBuf, ConfigError> {
    Ok(dirs.file(CONFIG_FILE_NAME)?)
}

/// Load settings from the app directory, returning defaults if the file is missing.
pub fn load_or_default() -> Result<RiskSettings, ConfigError> {
    load_settings_from(&config_path()?)
}

/// Load settings from an explicit file, returning defaults if it does not exist.
pub fn load_settings_from(path: &Path) -> Result<RiskSettings, ConfigError> {
    if !path.exists() {
        debug!("No config at {}; using defaults", path.display());
        return Ok(RiskSettings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = parse_settings(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    settings.validate()?;
    info!("Loaded settings from {}", path.display());
    Ok(settings)
}

fn parse_settings(text: &str) -> Result<RiskSettings, toml::de::Error> {
    toml::from_str::<RiskSettings>(text).map(RiskSettings::normalized)
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATASET_FILE)
}

fn default_evaluation_fraction() -> f64 {
    DEFAULT_EVALUATION_FRACTION
}

fn default_split_seed() -> u64 {
    DEFAULT_SPLIT_SEED
}

fn default_tree_count() -> usize {
    100
}

fn default_min_samples_split() -> usize {
    2
}

fn default_min_samples_leaf() -> usize {
    1
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings, RiskSettings::default());
        let options = settings.forest.train_options().unwrap();
        assert_eq!(options.tree_count, 100);
        assert_eq!(options.max_depth, None);
        assert_eq!(options.max_features, MaxFeatures::Sqrt);
        assert_eq!(options.seed, None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let settings = parse_settings(
            r#"
dataset_path = "data/pima.csv"

[split]
seed = 42

[forest]
tree_count = 0
max_depth = 6
max_features = 3
seed = 9
"#,
        )
        .unwrap();
        assert_eq!(settings.dataset_path, PathBuf::from("data/pima.csv"));
        assert_eq!(settings.split.evaluation_fraction, 0.2);
        assert_eq!(settings.split.seed, 42);
        assert_eq!(settings.forest.tree_count, 1);
        let options = settings.forest.train_options().unwrap();
        assert_eq!(options.max_depth, Some(6));
        assert_eq!(options.max_features, MaxFeatures::Count(3));
        assert_eq!(options.seed, Some(9));
    }

    #[test]
    fn rejects_unknown_max_features_rule() {
        let settings = parse_settings("[forest]\nmax_features = \"half\"\n").unwrap();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid {
                key: "forest.max_features",
                ..
            })
        ));
    }

    #[test]
    fn load_from_file_validates_fraction() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[split]\nevaluation_fraction = 1.5\n").unwrap();
        assert!(matches!(
            load_settings_from(&path),
            Err(ConfigError::Invalid {
                key: "split.evaluation_fraction",
                ..
            })
        ));

        std::fs::write(&path, "[split\n").unwrap();
        assert!(matches!(
            load_settings_from(&path),
            Err(ConfigError::ParseToml { .. })
        ));
    }

    #[test]
    fn missing_file_in_app_dir_gives_defaults() {
        let base = tempdir().unwrap();
        let dirs = AppDirs::under(base.path());
        let path = config_path_in(&dirs).unwrap();
        assert_eq!(path, dirs.root().join(CONFIG_FILE_NAME));
        assert_eq!(load_settings_from(&path).unwrap(), RiskSettings::default());
    }
}
