//! Test helpers for auth-core integration tests.
//!
//! - Starting a protocol server on an ephemeral port
//! - Talking raw protocol lines over TCP
//! - Building clients and HTTP routers against a running server

use auth_core::config::{GateConfig, SocketConfig};
use auth_core::{
    AuthEngine, AuthServer, DemoCredentials, SocketAuthClient, TokenStore, WebState, build_router,
};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const DEMO_USERNAME: &str = "admin";
pub const DEMO_PASSWORD: &str = "password123";

/// Short timeouts so failure-path tests finish quickly.
pub const TEST_TIMEOUT: Duration = Duration::from_millis(500);

/// Protocol config bound to an ephemeral loopback port.
pub fn test_socket_config() -> SocketConfig {
    SocketConfig {
        port: 0,
        connect_timeout_ms: TEST_TIMEOUT.as_millis() as u64,
        read_timeout_ms: TEST_TIMEOUT.as_millis() as u64,
        ..SocketConfig::default()
    }
}

/// Start a server with the demo credentials and return it with its address.
pub async fn start_test_server() -> (AuthServer, SocketAddr) {
    let engine = AuthEngine::new(
        Arc::new(DemoCredentials::new(DEMO_USERNAME, DEMO_PASSWORD)),
        Arc::new(TokenStore::new()),
    );
    let mut server = AuthServer::new(test_socket_config(), engine);
    let addr = server
        .start()
        .await
        .expect("Failed to start auth server")
        .expect("Server should be enabled");
    (server, addr)
}

/// Send raw protocol text and read the reply until the server closes.
pub async fn send_raw(addr: SocketAddr, input: &str, half_close: bool) -> String {
    let mut stream = TcpStream::connect(addr)
        .await
        .expect("Failed to connect to auth server");
    stream
        .write_all(input.as_bytes())
        .await
        .expect("Failed to send request");
    if half_close {
        stream.shutdown().await.expect("Failed to half-close");
    }

    let mut reply = String::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_string(&mut reply))
        .await
        .expect("Server did not close the connection")
        .expect("Failed to read reply");
    reply
}

pub fn client_for(addr: SocketAddr) -> SocketAuthClient {
    SocketAuthClient::new(addr.to_string(), TEST_TIMEOUT, TEST_TIMEOUT)
}

/// An address nothing listens on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    listener.local_addr().expect("Probe listener has no address")
}

/// Router with a protected `/quad/ping` endpoint behind the gate.
pub fn gated_router(client: SocketAuthClient) -> Router {
    gated_router_with(client, GateConfig::default())
}

pub fn gated_router_with(client: SocketAuthClient, config: GateConfig) -> Router {
    let state = WebState::new(Arc::new(client), config);
    let app_routes = Router::new()
        .route("/quad/ping", get(|| async { "pong" }))
        .route("/public/ping", get(|| async { "public" }))
        .route("/actuator/health", get(|| async { "up" }));
    build_router(state, app_routes)
}
