use crate::helpers::{send_raw, start_test_server, test_socket_config};

use auth_core::error::ServerError;
use auth_core::{AuthEngine, AuthServer, DemoCredentials, TokenStore};

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

fn demo_server(enabled: bool, port: u16) -> AuthServer {
    let mut config = test_socket_config();
    config.enabled = enabled;
    config.port = port;
    AuthServer::new(
        config,
        AuthEngine::new(
            Arc::new(DemoCredentials::new("admin", "password123")),
            Arc::new(TokenStore::new()),
        ),
    )
}

/// **VALUE**: Verifies a disabled server never binds.
///
/// **WHY THIS MATTERS**: The enabled flag is the only way to run the HTTP side
/// without the protocol listener.
#[tokio::test]
async fn given_disabled_config_when_start_then_returns_none_and_not_running() {
    let mut server = demo_server(false, 0);

    let addr = server.start().await.expect("disabled start is not an error");

    assert_eq!(addr, None);
    assert!(!server.is_running());
    assert_eq!(server.local_addr(), None);
}

/// **VALUE**: Verifies stop is safe before start and when called twice.
///
/// **BUG THIS CATCHES**: Would catch a panic on unwrapping a missing handle.
#[tokio::test]
async fn given_server_when_stop_before_start_and_twice_then_no_panic() {
    let mut never_started = demo_server(true, 0);
    never_started.stop().await;
    never_started.stop().await;

    let (mut server, _addr) = start_test_server().await;
    server.stop().await;
    server.stop().await;
    assert!(!server.is_running());
}

#[tokio::test]
async fn given_running_server_when_start_again_then_returns_same_address() {
    let (mut server, addr) = start_test_server().await;

    let again = server.start().await.expect("second start");

    assert_eq!(again, Some(addr));
    server.stop().await;
}

/// **VALUE**: Verifies a taken port is reported as a bind error.
#[tokio::test]
async fn given_port_in_use_when_start_then_bind_error() {
    // GIVEN: One server holding a port
    let (mut first, addr) = start_test_server().await;

    // WHEN: A second server tries the same port
    let mut second = demo_server(true, addr.port());
    let result = second.start().await;

    // THEN: Bind error, nothing running
    assert!(matches!(result, Err(ServerError::Bind { .. })));
    assert!(!second.is_running());

    first.stop().await;
}

/// **VALUE**: Verifies stop closes the listener and drops every session.
///
/// **WHY THIS MATTERS**: Tokens are in-memory only; a restarted service must not
/// honour tokens from a previous run, and the port must be released.
#[tokio::test]
async fn given_live_session_when_stop_then_store_cleared_and_port_closed() {
    // GIVEN: A live session
    let (mut server, addr) = start_test_server().await;
    let login = send_raw(addr, "admin\npassword123\n", false).await;
    let token = login.lines().nth(1).expect("token line").to_string();
    assert!(server.engine().is_token_valid(&token));

    // WHEN: Stopping
    server.stop().await;

    // THEN: Session gone and nothing accepts on the port
    assert!(!server.engine().is_token_valid(&token));
    assert!(TcpStream::connect(addr).await.is_err());
}

/// **VALUE**: Verifies stop does not wait for idle clients.
///
/// **BUG THIS CATCHES**: Would catch a shutdown that hangs until every open
/// connection sends its request.
#[tokio::test]
async fn given_idle_open_connection_when_stop_then_completes_and_connection_closed() {
    // GIVEN: A client that connects and never writes
    let (mut server, addr) = start_test_server().await;
    let mut idle = TcpStream::connect(addr).await.expect("connect");
    tokio::time::sleep(Duration::from_millis(50)).await;

    // WHEN: Stopping
    tokio::time::timeout(Duration::from_secs(2), server.stop())
        .await
        .expect("stop should not wait for idle clients");

    // THEN: The idle client sees the connection end
    let mut buf = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(2), idle.read_to_end(&mut buf))
        .await
        .expect("connection should be closed by stop");
    assert!(read.map(|n| n == 0).unwrap_or(true));
}
