// Unit tests for error construction
// Location capture and display formatting

use crate::error::{ClientError, ConfigError, ServerError, TokenStoreError};

use std::io::{Error as IoError, ErrorKind};
use std::net::SocketAddr;
use std::time::Duration;

/// **VALUE**: Verifies constructors record the caller's location, not their own.
///
/// **WHY THIS MATTERS**: Every logged error carries `[file:line:col]`; pointing
/// at the constructor would make that useless.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[track_caller]` on a constructor.
#[test]
fn given_error_constructor_when_called_then_location_points_at_caller() {
    let error = ConfigError::validation("bad value");

    let message = error.to_string();

    assert!(message.contains("bad value"));
    assert!(message.contains("errors.rs"), "message was {message}");
}

#[test]
fn given_bind_failure_when_displayed_then_includes_address_and_cause() {
    let io = IoError::new(ErrorKind::AddrInUse, "address in use");

    let error = ServerError::bind("127.0.0.1:9090", &io);

    let message = error.to_string();
    assert!(message.contains("127.0.0.1:9090"));
    assert!(message.contains("address in use"));
}

#[test]
fn given_send_failure_when_displayed_then_includes_peer() {
    let peer = SocketAddr::from(([127, 0, 0, 1], 5555));
    let io = IoError::new(ErrorKind::BrokenPipe, "broken pipe");

    let error = ServerError::send(peer, &io);

    assert!(error.to_string().contains("127.0.0.1:5555"));
}

/// **VALUE**: Verifies each client failure reports its own category label.
///
/// **WHY THIS MATTERS**: The gate logs the category next to its 503; a shared
/// label would hide whether the server was down, slow or hung up.
#[test]
fn given_client_errors_when_error_category_then_distinct_labels() {
    let io = IoError::new(ErrorKind::ConnectionRefused, "refused");
    let errors = [
        ClientError::connect("127.0.0.1:1", &io),
        ClientError::timeout("read", Duration::from_millis(5)),
        ClientError::closed(),
        ClientError::from(IoError::new(ErrorKind::UnexpectedEof, "eof")),
    ];

    let categories: Vec<&str> = errors.iter().map(ClientError::error_category).collect();

    assert_eq!(categories, vec!["connect", "timeout", "closed", "io"]);
}

#[test]
fn given_collision_error_when_displayed_then_includes_attempts() {
    let error = TokenStoreError::collision(3);

    let message = error.to_string();

    assert!(message.contains("after 3 attempts"), "message was {message}");
    assert!(message.contains("errors.rs"), "message was {message}");
}
