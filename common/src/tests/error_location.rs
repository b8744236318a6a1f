use crate::ErrorLocation;

use std::panic::Location;

#[track_caller]
fn capture_here() -> ErrorLocation {
    ErrorLocation::caller()
}

/// **VALUE**: Verifies that `ErrorLocation::from()` captures file, line and column.
///
/// **WHY THIS MATTERS**: Every error in the workspace embeds an ErrorLocation. If it
/// captured the wrong position, a failed bind or a dropped client connection would
/// point developers at the wrong line.
///
/// **BUG THIS CATCHES**: Would catch if `Location::caller()` is no longer propagated
/// or the file path is lost.
#[test]
fn given_location_caller_when_error_location_created_then_captures_file_line_column() {
    // GIVEN/WHEN: An ErrorLocation built from this exact line
    let location = ErrorLocation::from(Location::caller());

    // THEN: File, line and column are populated
    assert!(location.file.contains("error_location.rs"));
    assert!(location.line > 0);
    assert!(location.column > 0);
}

/// **VALUE**: Verifies that `ErrorLocation::caller()` reports the caller of a
/// `#[track_caller]` helper, not the helper itself.
///
/// **BUG THIS CATCHES**: Would catch if `caller()` loses its `#[track_caller]`
/// attribute, which would make every constructor report `error_location.rs` in the
/// common crate instead of the real call site.
#[test]
fn given_track_caller_helper_when_caller_used_then_reports_call_site() {
    // GIVEN: The line number of the call below
    let expected_line = line!() + 3;

    // WHEN: Capturing through a #[track_caller] helper
    let location = capture_here();

    // THEN: The reported line is the call site in this test
    assert_eq!(location.line, expected_line);
    assert!(location.file.contains("tests"));
}

/// **VALUE**: Verifies the `[file:line:column]` display format.
///
/// **WHY THIS MATTERS**: Log lines and HTTP error bodies rely on this format being
/// compact and greppable.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: A fixed location
    let location = ErrorLocation {
        file: "src/server/mod.rs",
        line: 42,
        column: 7,
    };

    // WHEN: Formatting
    let formatted = location.to_string();

    // THEN: Bracketed, colon-separated
    assert_eq!(formatted, "[src/server/mod.rs:42:7]");
}
