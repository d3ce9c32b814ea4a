//! Core logging bootstrap and safety policy.
//!
//! # Responsibility
//! - Start the process-wide rolling file logger on first request.
//! - Keep later init attempts honest about the active configuration.
//!
//! # Invariants
//! - One (level, directory) pair per process; repeats are accepted,
//!   conflicting pairs are rejected.
//! - Initialization returns errors as strings and never panics.
//! - Log lines carry identifiers and counters, never event titles.
//!
//! # See also
//! - docs/architecture/logging.md

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_BASENAME: &str = "solunar";
const LOG_ROTATE_BYTES: u64 = 10 * 1024 * 1024;
const LOG_KEEP_FILES: usize = 5;

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();

struct ActiveLogger {
    level: &'static str,
    directory: PathBuf,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    /// Checks a repeated init call against the active configuration.
    fn accepts(&self, level: &'static str, directory: &Path) -> Result<(), String> {
        if self.directory != directory {
            return Err(format!(
                "logging already active under `{}`; cannot redirect to `{}`",
                self.directory.display(),
                directory.display()
            ));
        }
        if self.level != level {
            return Err(format!(
                "logging already active at level `{}`; cannot change to `{}`",
                self.level, level
            ));
        }
        Ok(())
    }
}

/// Activates rolling file logging at `level` under `log_dir`.
///
/// Safe to call more than once with the same arguments. The embedding
/// process decides level and directory; this crate only validates them.
///
/// # Errors
/// - `level` is not one of trace/debug/info/warn/error.
/// - `log_dir` is empty, relative, or cannot be created.
/// - The logger backend fails to start.
/// - Logging is already active with different settings.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), String> {
    let requested_level = canonical_level(level)?;
    let requested_dir = absolute_log_dir(log_dir)?;

    if let Some(active) = ACTIVE_LOGGER.get() {
        return active.accepts(requested_level, &requested_dir);
    }

    let dir = requested_dir.clone();
    let active = ACTIVE_LOGGER.get_or_try_init(|| -> Result<ActiveLogger, String> {
        let handle = start_file_logger(requested_level, &dir)?;
        info!(
            "event=logging_init module=core status=ok level={} log_dir={}",
            requested_level,
            dir.display()
        );
        info!(
            "event=build_info module=core status=ok platform={} build_mode={} version={}",
            std::env::consts::OS,
            build_mode(),
            env!("CARGO_PKG_VERSION")
        );
        Ok(ActiveLogger {
            level: requested_level,
            directory: dir,
            _handle: handle,
        })
    })?;

    // A concurrent first caller may have won the init race with other
    // settings; the winner's configuration is authoritative.
    active.accepts(requested_level, &requested_dir)
}

/// Creates the log directory and starts the rolling file logger.
fn start_file_logger(level: &'static str, directory: &Path) -> Result<LoggerHandle, String> {
    std::fs::create_dir_all(directory).map_err(|err| {
        format!(
            "cannot create log directory `{}`: {err}",
            directory.display()
        )
    })?;

    Logger::try_with_str(level)
        .map_err(|err| format!("log level `{level}` was rejected: {err}"))?
        .log_to_file(
            FileSpec::default()
                .directory(directory)
                .basename(LOG_BASENAME),
        )
        .rotate(
            Criterion::Size(LOG_ROTATE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(LOG_KEEP_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        // Lines: [YYYY-MM-DD HH:MM:SS.ffffff TZ] LEVEL [module] file:line: message
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("logger startup failed: {err}"))
}

/// Reports `(level, log_dir)` of the active logger, `None` before init.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE_LOGGER
        .get()
        .map(|active| (active.level, active.directory.clone()))
}

/// Level used when the embedding process expresses no preference:
/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn canonical_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unrecognized log level `{other}` (expected trace, debug, info, warn or error)"
        )),
    }
}

fn absolute_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log_dir must not be empty".to_string());
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Err(format!("log_dir `{trimmed}` is not an absolute path"))
    }
}

fn build_mode() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}
