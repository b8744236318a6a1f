// Unit tests for logger module initialization logic
// Tests focus on idempotence and error handling

use crate::logger::{LogTarget, build_dispatch, initialize};

use std::path::PathBuf;

use log::LevelFilter;
use tempfile::TempDir;

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: Both binaries and the tests may reach logger setup more
/// than once. A second global logger install would otherwise fail startup.
///
/// **BUG THIS CATCHES**: Would catch if the Once or AtomicBool guards are removed,
/// causing fern to fail when trying to set a global logger twice.
#[test]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A valid temporary directory
    let temp_dir = TempDir::new().expect("create temp dir");

    // WHEN: Calling initialize twice
    let result1 = initialize(LogTarget::server(temp_dir.path()));
    let result2 = initialize(LogTarget::server(temp_dir.path()));

    // THEN: Both return Ok (second one logs a warning)
    assert!(result1.is_ok(), "First initialization should succeed");
    assert!(
        result2.is_ok(),
        "Second initialization should succeed (idempotent)"
    );
}

/// **VALUE**: Verifies that an unwritable log directory is a clear error.
///
/// **WHY THIS MATTERS**: A bad log directory must fail startup with a message,
/// not a panic deep inside fern.
///
/// **BUG THIS CATCHES**: Would catch if `fern::log_file()` were unwrapped.
#[test]
fn given_invalid_log_dir_when_building_dispatch_then_returns_error() {
    // GIVEN: A path that cannot hold a file on Unix-like systems
    let invalid_dir = PathBuf::from("/dev/null/invalid-path");

    // WHEN: Building the dispatcher
    let result = build_dispatch(LogTarget::server(&invalid_dir), LevelFilter::Info);

    // THEN: Gateway error naming the file
    let err = result.err().expect("invalid directory should fail");
    let err_string = format!("{err:?}");
    assert!(err_string.contains("Gateway"));
    assert!(err_string.contains("gateway.log"));
}

/// **VALUE**: Verifies the client target writes its own file.
#[test]
fn given_client_target_when_building_dispatch_then_creates_client_log_file() {
    let temp_dir = TempDir::new().expect("create temp dir");

    let result = build_dispatch(LogTarget::client(temp_dir.path()), LevelFilter::Debug);

    assert!(result.is_ok());
    assert!(temp_dir.path().join("auth-login.log").exists());
}
