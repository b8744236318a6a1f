use gateway::app::{Gateway, PING_RESPONSE};

use auth_core::config::AuthConfig;

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

// ============================================================================
// End-to-end: real HTTP listener, real protocol server, real HTTP client
// ============================================================================

struct RunningGateway {
    http_addr: SocketAddr,
    socket_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<(), gateway::error::GatewayError>>,
}

async fn start_gateway() -> RunningGateway {
    let mut config = AuthConfig::default();
    config.socket.port = 0;

    let mut gateway = Gateway::new(config);
    let socket_addr = gateway
        .start_auth_server()
        .await
        .expect("Failed to start auth server")
        .expect("Auth server should be enabled");

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind HTTP listener");
    let http_addr = listener.local_addr().expect("HTTP listener address");

    let (shutdown, signal) = oneshot::channel::<()>();
    let task = tokio::spawn(gateway.serve(listener, async move {
        let _ = signal.await;
    }));

    RunningGateway {
        http_addr,
        socket_addr,
        shutdown,
        task,
    }
}

/// **VALUE**: Verifies the whole stack: HTTP login, gated call, logout, refusal.
///
/// **WHY THIS MATTERS**: This is exactly what a browser or script does. It proves
/// the router, the gate, the socket client and the protocol server agree on
/// headers, framing and status codes.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The gate points its client at the wrong port
/// - The login response body is not the bare token
/// - Logout does not reach the shared token store
#[tokio::test]
async fn given_running_gateway_when_login_call_logout_then_access_follows_session() {
    // GIVEN: Gateway on ephemeral ports
    let running = start_gateway().await;
    let base = format!("http://{}", running.http_addr);
    let http = reqwest::Client::new();

    // WHEN: Logging in over HTTP
    let login = http
        .post(format!("{base}/auth/authenticate"))
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("username=admin&password=password123")
        .send()
        .await
        .expect("login request");
    assert_eq!(login.status(), StatusCode::OK);
    let token = login.text().await.expect("login body");

    // THEN: The protected route accepts the token
    let ping = http
        .get(format!("{base}/quad/ping"))
        .header("X-Auth-Token", &token)
        .send()
        .await
        .expect("ping request");
    assert_eq!(ping.status(), StatusCode::OK);
    assert_eq!(ping.text().await.expect("ping body"), PING_RESPONSE);

    // WHEN: Logging out
    let logout = http
        .post(format!("{base}/auth/logout"))
        .header("X-Auth-Token", &token)
        .send()
        .await
        .expect("logout request");
    assert_eq!(logout.status(), StatusCode::OK);

    // THEN: The same token is refused
    let refused = http
        .get(format!("{base}/quad/ping"))
        .header("X-Auth-Token", &token)
        .send()
        .await
        .expect("ping request");
    assert_eq!(refused.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(refused.text().await.expect("body"), "Invalid token.");

    let _ = running.shutdown.send(());
    running
        .task
        .await
        .expect("gateway task panicked")
        .expect("gateway should stop cleanly");
}

/// **VALUE**: Verifies graceful shutdown also stops the protocol server.
///
/// **BUG THIS CATCHES**: Would catch the socket listener outliving the HTTP side.
#[tokio::test]
async fn given_running_gateway_when_shutdown_then_both_listeners_closed() {
    // GIVEN: Running gateway
    let running = start_gateway().await;

    // WHEN: Signalling shutdown
    let _ = running.shutdown.send(());
    tokio::time::timeout(Duration::from_secs(5), running.task)
        .await
        .expect("gateway should stop promptly")
        .expect("gateway task panicked")
        .expect("gateway should stop cleanly");

    // THEN: Neither port accepts connections
    assert!(TcpStream::connect(running.socket_addr).await.is_err());
    assert!(TcpStream::connect(running.http_addr).await.is_err());
}
