//! Logging for the gateway binaries.
//!
//! Every record goes to a plain log file; the server additionally echoes to a
//! colored stdout. The interactive client keeps stdout for its prompts and only
//! logs to file.

use crate::error::GatewayError;

use common::ErrorLocation;

use std::env;
use std::fmt::Display;
use std::io::stdout;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use fern::{Dispatch, FormatCallback};
use humantime::format_rfc3339;
use log::{LevelFilter, Record, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

/// Overrides the build-dependent default level (`trace`, `debug`, `info`, ...).
pub const ENV_LOG_LEVEL: &str = "GATEWAY_LOG_LEVEL";

pub const SERVER_LOG_FILE: &str = "gateway.log";
pub const CLIENT_LOG_FILE: &str = "auth-login.log";

#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Where log records go.
#[derive(Debug, Clone, Copy)]
pub struct LogTarget<'a> {
    pub log_dir: &'a Path,
    pub file_name: &'a str,
    pub echo_to_stdout: bool,
}

impl<'a> LogTarget<'a> {
    /// File plus colored stdout, for the long-running server.
    pub fn server(log_dir: &'a Path) -> Self {
        Self {
            log_dir,
            file_name: SERVER_LOG_FILE,
            echo_to_stdout: true,
        }
    }

    /// File only, so prompts on stdout stay readable.
    pub fn client(log_dir: &'a Path) -> Self {
        Self {
            log_dir,
            file_name: CLIENT_LOG_FILE,
            echo_to_stdout: false,
        }
    }
}

/// Install the global logger.
///
/// Safe to call more than once: later calls log a warning and return `Ok`.
///
/// # Errors
///
/// Returns [`GatewayError::Gateway`] if the log file cannot be created or a
/// global logger is already installed by someone else.
pub fn initialize(target: LogTarget<'_>) -> Result<(), GatewayError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized");
        return Ok(());
    }

    let level = level_from_env();
    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(target, level);
        if result.is_ok() {
            info!("Logger initialized with level: {level:?}");
        }
    });

    result
}

/// `GATEWAY_LOG_LEVEL` if set and valid, otherwise the build default.
pub fn level_from_env() -> LevelFilter {
    env::var(ENV_LOG_LEVEL)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(DEFAULT_LOG_LEVEL)
}

#[track_caller]
fn initialize_internal(target: LogTarget<'_>, level: LevelFilter) -> Result<(), GatewayError> {
    build_dispatch(target, level)?
        .apply()
        .map_err(|e| GatewayError::Gateway {
            message: format!("Failed to initialize logger: {e}"),
            location: ErrorLocation::from(std::panic::Location::caller()),
        })
}

/// Build the dispatcher for `target` without installing it.
#[track_caller]
pub(crate) fn build_dispatch(
    target: LogTarget<'_>,
    level: LevelFilter,
) -> Result<Dispatch, GatewayError> {
    let log_file_path = target.log_dir.join(target.file_name);

    let log_file = fern::log_file(&log_file_path).map_err(|e| GatewayError::Gateway {
        message: format!("Failed to create log file {}: {e}", log_file_path.display()),
        location: ErrorLocation::from(std::panic::Location::caller()),
    })?;

    let file_dispatch = Dispatch::new()
        .format(|out, message, record| write_line(out, record.level(), message, record))
        .chain(log_file);

    let mut root = Dispatch::new().level(level).chain(file_dispatch);

    if target.echo_to_stdout {
        let colors = ColoredLevelConfig::new()
            .debug(Blue)
            .info(Green)
            .warn(Yellow)
            .error(Red)
            .trace(Magenta);

        root = root.chain(
            Dispatch::new()
                .format(move |out, message, record| {
                    write_line(out, colors.color(record.level()), message, record)
                })
                .chain(stdout()),
        );
    }

    Ok(root)
}

fn write_line(
    out: FormatCallback<'_>,
    level: impl Display,
    message: &std::fmt::Arguments<'_>,
    record: &Record<'_>,
) {
    out.finish(format_args!(
        "[{date} - {level}] {message} [{file}:{line}]",
        date = format_rfc3339(SystemTime::now()),
        file = record.file().unwrap_or("unknown"),
        line = record.line().unwrap_or(0),
    ))
}
