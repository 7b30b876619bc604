//! Logging setup for the command-line front ends.
//!
//! Installs a global tracing subscriber with a stderr layer and, optionally, a per-launch log file
//! under the app directory. Stdout stays reserved for assessment output. Log files are timestamped
//! and only the newest few are kept.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::OnceLock,
    time::SystemTime,
};

use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs::{AppDirError, AppDirs};

/// Maximum number of log files to retain.
const MAX_LOG_FILES: usize = 10;
const LOG_FILE_PREFIX: &str = "diabetes-risk";

static LOG_GUARD: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Log directory unavailable: {0}")]
    AppDir(#[from] AppDirError),
    #[error("Failed to read log directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to remove old log file {}: {source}", path.display())]
    RemoveFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to create log file at {}: {source}", path.display())]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to format log filename time: {0}")]
    FormatTime(time::error::Format),
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(tracing::subscriber::SetGlobalDefaultError),
}

/// What the front end wants logged, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    /// Filter used when `RUST_LOG` is unset.
    pub default_level: &'static str,
    /// Also write a per-launch file under the app's `logs` directory.
    pub write_file: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            default_level: "info",
            write_file: true,
        }
    }
}

/// Initialize tracing with the default options.
pub fn init() -> Result<(), LoggingError> {
    init_with(LogOptions::default())
}

/// Initialize tracing. Subsequent calls are no-ops.
///
/// If the log file cannot be prepared, the stderr layer is still installed and the file error is
/// returned so the caller can report it.
pub fn init_with(options: LogOptions) -> Result<(), LoggingError> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    let timer = build_timer();
    let stderr_layer = fmt::layer()
        .with_timer(timer.clone())
        .with_writer(std::io::stderr);

    let (file_layer, guard, file_result) = if options.write_file {
        match open_log_file() {
            Ok((log_dir, file_name)) => {
                let (writer, guard) =
                    tracing_appender::non_blocking(rolling::never(&log_dir, &file_name));
                let layer = fmt::layer()
                    .with_ansi(false)
                    .with_timer(timer)
                    .with_writer(writer);
                (Some(layer), Some(guard), Ok(Some(log_dir.join(file_name))))
            }
            Err(err) => (None, None, Err(err)),
        }
    } else {
        (None, None, Ok(None))
    };

    let subscriber = Registry::default()
        .with(build_env_filter(options.default_level))
        .with(stderr_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::SetGlobal)?;
    let _ = LOG_GUARD.set(guard);

    if let Ok(Some(path)) = &file_result {
        tracing::debug!("Logging to {}", path.display());
    }
    file_result.map(|_| ())
}

fn open_log_file() -> Result<(PathBuf, String), LoggingError> {
    let log_dir = AppDirs::resolve()?.logs_dir()?;
    let file_name = format_log_file_name(now_local_or_utc())?;
    ensure_file_exists(&log_dir.join(&file_name))?;
    prune_old_logs(&log_dir, MAX_LOG_FILES)?;
    Ok((log_dir, file_name))
}

fn ensure_file_exists(path: &Path) -> Result<(), LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| LoggingError::CreateLogFile {
            path: path.to_path_buf(),
            source,
        })
}

fn prune_old_logs(dir: &Path, max_files: usize) -> Result<(), LoggingError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|source| LoggingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_file()))
        .filter(|entry| entry.path().extension().and_then(|ext| ext.to_str()) == Some("log"))
        .map(|entry| {
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.path())
        })
        .collect::<Vec<_>>();

    entries.sort_by_key(|(modified, _)| *modified);
    let excess = entries.len().saturating_sub(max_files);
    for (_, path) in entries.into_iter().take(excess) {
        fs::remove_file(&path).map_err(|source| LoggingError::RemoveFile { path, source })?;
    }
    Ok(())
}

fn format_log_file_name(now: OffsetDateTime) -> Result<String, LoggingError> {
    const NAME_FORMAT: &[FormatItem<'_>] =
        format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    let name = now.format(NAME_FORMAT).map_err(LoggingError::FormatTime)?;
    Ok(format!("{LOG_FILE_PREFIX}_{name}.log"))
}

fn build_timer() -> fmt::time::OffsetTime<time::format_description::BorrowedFormatItem<'static>> {
    const DISPLAY_FORMAT: &[FormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, DISPLAY_FORMAT.into())
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn build_env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
