//! Where the front ends keep their settings and log files.
//!
//! Everything lives in one `.diabetes-risk` folder under the OS config directory, or under
//! `DIABETES_RISK_CONFIG_HOME` when that is set to a non-empty path.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use thiserror::Error;

/// Folder created under the config base directory.
pub const APP_DIR_NAME: &str = ".diabetes-risk";
/// Environment variable replacing the OS config directory as the base.
pub const CONFIG_HOME_ENV: &str = "DIABETES_RISK_CONFIG_HOME";
const LOGS_DIR_NAME: &str = "logs";

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No config directory available; set {CONFIG_HOME_ENV}")]
    NoBaseDir,
    #[error("Failed to create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The app folder. Resolving it touches nothing on disk; directories are created on first use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    root: PathBuf,
}

impl AppDirs {
    /// Resolve from `DIABETES_RISK_CONFIG_HOME`, falling back to the OS config directory.
    pub fn resolve() -> Result<Self, AppDirError> {
        let base = std::env::var_os(CONFIG_HOME_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()))
            .ok_or(AppDirError::NoBaseDir)?;
        Ok(Self::under(base))
    }

    /// App folder inside an explicit base directory.
    pub fn under(base: impl AsRef<Path>) -> Self {
        Self {
            root: base.as_ref().join(APP_DIR_NAME),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `file_name` in the app folder, creating the folder if needed.
    pub fn file(&self, file_name: &str) -> Result<PathBuf, AppDirError> {
        ensure_dir(&self.root)?;
        Ok(self.root.join(file_name))
    }

    /// The `logs` folder, created if needed.
    pub fn logs_dir(&self) -> Result<PathBuf, AppDirError> {
        let path = self.root.join(LOGS_DIR_NAME);
        ensure_dir(&path)?;
        Ok(path)
    }
}

fn ensure_dir(path: &Path) -> Result<(), AppDirError> {
    std::fs::create_dir_all(path).map_err(|source| AppDirError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}
