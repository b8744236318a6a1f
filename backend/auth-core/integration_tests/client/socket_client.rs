use crate::helpers::{
    DEMO_PASSWORD, DEMO_USERNAME, TEST_TIMEOUT, client_for, start_test_server, unused_addr,
};

use auth_core::AuthClient;
use auth_core::error::ClientError;

use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;

// ============================================================================
// SocketAuthClient against a real protocol server
// ============================================================================

/// **VALUE**: Verifies the client round-trip: login, validate, revoke, validate.
///
/// **WHY THIS MATTERS**: The HTTP gate only ever talks to the service through
/// this client. If it misreads a reply, every protected request fails.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The client sends the wrong keyword or framing
/// - The token line is not read after `true`
/// - Booleans are parsed case-sensitively or with whitespace
#[tokio::test]
async fn given_running_server_when_client_round_trip_then_token_lifecycle_holds() {
    // GIVEN: Running server and a client
    let (mut server, addr) = start_test_server().await;
    let client = client_for(addr);

    // WHEN: Logging in
    let token = client
        .authenticate(DEMO_USERNAME, DEMO_PASSWORD)
        .await
        .expect("service reachable")
        .expect("credentials accepted");

    // THEN: Token validates, revokes, then no longer validates
    assert!(client.validate_token(&token).await.expect("validate"));
    assert!(client.revoke_token(&token).await.expect("revoke"));
    assert!(!client.validate_token(&token).await.expect("validate"));

    server.stop().await;
}

/// **VALUE**: Verifies a rejected login is `Ok(None)`, not an error.
///
/// **WHY THIS MATTERS**: `Ok(None)` maps to 401 and `Err` to 503; mixing them up
/// reports bad passwords as outages.
#[tokio::test]
async fn given_wrong_password_when_authenticate_then_ok_none() {
    let (mut server, addr) = start_test_server().await;
    let client = client_for(addr);

    let result = client.authenticate(DEMO_USERNAME, "wrong").await;

    assert!(matches!(result, Ok(None)));
    server.stop().await;
}

/// **VALUE**: Verifies credentials with line breaks are refused locally.
///
/// **BUG THIS CATCHES**: Would catch a username like `"x\nTOKEN_REVOKE"` being
/// sent and re-interpreted by the server as a different command.
#[tokio::test]
async fn given_line_break_in_fields_when_calling_then_refused_without_session() {
    let (mut server, addr) = start_test_server().await;
    let client = client_for(addr);

    let login = client
        .authenticate("admin\npassword123", "x")
        .await
        .expect("no transport error");
    let valid = client
        .validate_token("abc\nTOKEN_CHECK")
        .await
        .expect("no transport error");

    assert_eq!(login, None);
    assert!(!valid);
    assert!(server.engine().store().is_empty());
    server.stop().await;
}

/// **VALUE**: Verifies an unreachable service is reported as an unavailable error.
#[tokio::test]
async fn given_no_server_when_validate_then_connect_error() {
    let client = client_for(unused_addr().await);

    let err = client
        .validate_token("anything")
        .await
        .expect_err("nothing is listening");

    assert!(matches!(err, ClientError::Connect { .. }));
}

/// **VALUE**: Verifies a server that accepts but never answers times out.
///
/// **WHY THIS MATTERS**: Without a read timeout a hung service would hang every
/// gated HTTP request with it.
///
/// **BUG THIS CATCHES**: Would catch a missing or unbounded read timeout.
#[tokio::test]
async fn given_silent_server_when_authenticate_then_times_out_promptly() {
    // GIVEN: A listener that never reads or replies
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind silent listener");
    let client = client_for(listener.local_addr().expect("local addr"));

    // WHEN: Logging in
    let started = Instant::now();
    let err = client
        .authenticate(DEMO_USERNAME, DEMO_PASSWORD)
        .await
        .expect_err("silent server must time out");

    // THEN: Timeout error, within a reasonable bound of the configured timeout
    assert!(matches!(err, ClientError::Timeout { .. }), "got {err}");
    assert!(started.elapsed() < TEST_TIMEOUT + Duration::from_secs(2));

    drop(listener);
}

/// **VALUE**: Verifies a server that reads the request and hangs up without a
/// reply surfaces as `Closed`, located in the client rather than the error module.
///
/// **BUG THIS CATCHES**: Would catch a reply-less EOF being read as a rejected
/// login, or the error location pointing at the constructor.
#[tokio::test]
async fn given_server_closes_without_reply_when_authenticate_then_closed_error_at_call_site() {
    // GIVEN: A listener that reads both request lines, then closes
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let client = client_for(listener.local_addr().expect("local addr"));
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        for _ in 0..2 {
            line.clear();
            reader.read_line(&mut line).await.expect("read request line");
        }
    });

    // WHEN: Logging in
    let err = client
        .authenticate(DEMO_USERNAME, DEMO_PASSWORD)
        .await
        .expect_err("reply-less close must be an error");

    // THEN: Closed, with the location of the read in the client
    assert!(matches!(err, ClientError::Closed { .. }), "got {err}");
    let message = err.to_string();
    assert!(message.contains("mod.rs"), "message was {message}");
    assert!(!message.contains("error/client.rs"), "message was {message}");

    server.await.expect("listener task panicked");
}
