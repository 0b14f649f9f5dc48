//! Logging infrastructure for tickbox.
//!
//! Provides structured file logging with daily rotation to platform-standard directories.
//! The terminal belongs to the UI, so nothing is ever written to stdout or stderr
//! once the screen is up.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use directories::ProjectDirs;
use thiserror::Error;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, reload};

/// Prefix of log file names; the appender adds the date.
const LOG_FILE_PREFIX: &str = "tickbox";

/// Log files older than this are deleted at startup.
const RETENTION_DAYS: u64 = 7;

/// Handle for changing the log filter after startup.
pub type ReloadHandle = reload::Handle<EnvFilter, Registry>;

/// Result of initializing the logging system.
pub struct LoggingContext {
    /// Guard that must be held for the application lifetime to ensure logs are flushed.
    pub _guard: WorkerGuard,
    /// The session ID for this invocation.
    pub session_id: String,
    /// The directory where logs are written.
    pub log_directory: PathBuf,
    pub reload_handle: ReloadHandle,
}

/// Error that occurred during logging initialization.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LoggingError {
    pub message: String,
}

impl LoggingError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Generates a 6-character random hex session ID.
fn generate_session_id() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let bytes: [u8; 3] = rng.random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Build the filter: `RUST_LOG` if set, otherwise the given level.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| parse_level(level))
}

/// Parse a level directive, falling back to `info` when it is invalid.
fn parse_level(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes the logging system.
///
/// Returns a `LoggingContext` on success, or a `LoggingError` on failure.
/// The returned `WorkerGuard` must be held for the application lifetime.
pub fn init(level: &str) -> Result<LoggingContext, LoggingError> {
    let session_id = generate_session_id();

    // macOS: ~/Library/Logs/tickbox/
    // Linux: ~/.local/state/tickbox/
    // Windows: %LocalAppData%\tickbox\
    let log_dir = log_directory()
        .ok_or_else(|| LoggingError::new("Failed to determine log directory"))?;

    fs::create_dir_all(&log_dir)
        .map_err(|e| LoggingError::new(format!("Failed to create log directory: {}", e)))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let (filter, reload_handle) = reload::Layer::new(build_filter(level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_span_events(FmtSpan::NONE)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| LoggingError::new(format!("Failed to install subscriber: {}", e)))?;

    info!(session_id = %session_id, "session_start");

    Ok(LoggingContext {
        _guard: guard,
        session_id,
        log_directory: log_dir,
        reload_handle,
    })
}

/// Platform log directory.
fn log_directory() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::home_dir().map(|home| home.join("Library").join("Logs").join(LOG_FILE_PREFIX))
    } else {
        ProjectDirs::from("dev", "tickbox", "tickbox")
            .and_then(|dirs| dirs.state_dir().map(PathBuf::from))
    }
}

/// Change the active log level.
pub fn update_log_level(handle: &ReloadHandle, level: &str) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| LoggingError::new(format!("Invalid log level {:?}: {}", level, e)))?;
    handle
        .reload(filter)
        .map_err(|e| LoggingError::new(format!("Failed to reload log filter: {}", e)))
}

/// Whether a file name is one of our rotated log files.
fn is_log_file(name: &str) -> bool {
    name.strip_prefix(LOG_FILE_PREFIX)
        .is_some_and(|rest| rest.len() > 1 && rest.starts_with('.'))
}

/// Whether a file last modified at `modified` is past retention at `now`.
/// Files from the future are kept.
fn is_expired(modified: SystemTime, now: SystemTime) -> bool {
    let retention = Duration::from_secs(RETENTION_DAYS * 24 * 60 * 60);
    now.duration_since(modified)
        .is_ok_and(|age| age > retention)
}

/// Cleans up log files older than the retention period.
///
/// Errors are logged at WARN level but don't prevent app startup.
pub fn cleanup_old_logs(log_dir: &Path) {
    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "log_cleanup_read_dir_failed");
            return;
        }
    };

    let now = SystemTime::now();
    let mut deleted_count = 0u32;

    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_log_file(file_name) {
            continue;
        }

        let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                warn!(file = %file_name, error = %e, "log_cleanup_metadata_failed");
                continue;
            }
        };
        if !is_expired(modified, now) {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => deleted_count += 1,
            Err(e) => warn!(file = %file_name, error = %e, "log_cleanup_delete_failed"),
        }
    }

    if deleted_count > 0 {
        debug!(count = deleted_count, "log_cleanup_completed");
    }
}
