use crate::helpers::{
    DEMO_PASSWORD, DEMO_USERNAME, client_for, gated_router, gated_router_with, start_test_server,
    unused_addr,
};

use auth_core::AuthClient;
use auth_core::config::GateConfig;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn body_text(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

fn get_with(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).expect("Failed to build request")
}

// ============================================================================
// Token gate in front of a protected route
// ============================================================================

/// **VALUE**: Verifies a protected route without a token is refused with 401.
///
/// **BUG THIS CATCHES**: Would catch the gate forwarding requests that carry no
/// token at all.
#[tokio::test]
async fn given_no_token_when_request_protected_route_then_401_missing_token() {
    // GIVEN: Router in front of a running service
    let (mut server, addr) = start_test_server().await;
    let app = gated_router(client_for(addr));

    // WHEN: Requesting a protected route with no headers
    let response = app.oneshot(get("/quad/ping")).await.expect("request");

    // THEN: 401 with the header name in the message
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_text(response).await,
        "Missing token. Provide X-Auth-Token header."
    );
    server.stop().await;
}

/// **VALUE**: Verifies a blank token header counts as missing.
#[tokio::test]
async fn given_blank_token_when_request_protected_route_then_401_missing_token() {
    let (mut server, addr) = start_test_server().await;
    let app = gated_router(client_for(addr));

    let response = app
        .oneshot(get_with("/quad/ping", &[("X-Auth-Token", "   ")]))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.starts_with("Missing token."));
    server.stop().await;
}

#[tokio::test]
async fn given_unknown_token_when_request_protected_route_then_401_invalid_token() {
    let (mut server, addr) = start_test_server().await;
    let app = gated_router(client_for(addr));

    let response = app
        .oneshot(get_with("/quad/ping", &[("X-Auth-Token", "bogus")]))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "Invalid token.");
    server.stop().await;
}

/// **VALUE**: Verifies a valid token reaches the downstream handler unchanged.
///
/// **WHY THIS MATTERS**: This is the only success path of the gate. The token
/// must stay valid afterwards, since the gate only checks it.
#[tokio::test]
async fn given_valid_token_when_request_protected_route_then_handler_runs() {
    // GIVEN: A token from the service
    let (mut server, addr) = start_test_server().await;
    let client = client_for(addr);
    let token = client
        .authenticate(DEMO_USERNAME, DEMO_PASSWORD)
        .await
        .expect("service reachable")
        .expect("credentials accepted");
    let app = gated_router(client.clone());

    // WHEN: Requesting with the token
    let response = app
        .oneshot(get_with("/quad/ping", &[("X-Auth-Token", token.as_str())]))
        .await
        .expect("request");

    // THEN: Handler output, token still live
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "pong");
    assert!(client.validate_token(&token).await.expect("validate"));
    server.stop().await;
}

/// **VALUE**: Verifies an unreachable service yields 503, not 401.
///
/// **WHY THIS MATTERS**: Callers retry on 503 but re-prompt for credentials on
/// 401. An outage must not look like a bad token.
#[tokio::test]
async fn given_service_down_when_request_with_token_then_503() {
    let app = gated_router(client_for(unused_addr().await));

    let response = app
        .oneshot(get_with("/quad/ping", &[("X-Auth-Token", "anything")]))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_text(response).await,
        "Authentication service unavailable."
    );
}

/// **VALUE**: Verifies routes outside the protected prefix skip the gate entirely.
#[tokio::test]
async fn given_unprotected_route_when_request_without_token_then_passes() {
    // No server at all: the gate must not even try to reach it.
    let app = gated_router(client_for(unused_addr().await));

    let response = app.oneshot(get("/public/ping")).await.expect("request");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "public");
}

/// **VALUE**: Verifies exempt prefixes win over a catch-all protected prefix.
///
/// **BUG THIS CATCHES**: Would catch the login endpoint being gated behind a
/// token, making it impossible to obtain one.
#[tokio::test]
async fn given_catch_all_prefix_when_request_exempt_route_then_passes() {
    let config = GateConfig {
        protected_path_prefix: "/".to_string(),
        ..GateConfig::default()
    };
    let app = gated_router_with(client_for(unused_addr().await), config);

    let exempt = app
        .clone()
        .oneshot(get("/actuator/health"))
        .await
        .expect("request");
    let gated = app.oneshot(get("/public/ping")).await.expect("request");

    assert_eq!(exempt.status(), StatusCode::OK);
    assert_eq!(gated.status(), StatusCode::UNAUTHORIZED);
}

/// **VALUE**: Verifies an empty protected prefix disables gating.
#[tokio::test]
async fn given_empty_prefix_when_request_any_route_then_passes() {
    let config = GateConfig {
        protected_path_prefix: String::new(),
        ..GateConfig::default()
    };
    let app = gated_router_with(client_for(unused_addr().await), config);

    let response = app.oneshot(get("/quad/ping")).await.expect("request");

    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Credential header fallback
// ============================================================================

/// **VALUE**: Verifies credential headers log in, forward and revoke afterwards.
///
/// **WHY THIS MATTERS**: Scripts without a session can call a protected route
/// once with username/password. The token minted for that call must not linger.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The fallback never forwards the request
/// - The one-shot token is left in the store
#[tokio::test]
async fn given_credential_headers_when_request_protected_route_then_forwards_and_revokes() {
    // GIVEN: Running service
    let (mut server, addr) = start_test_server().await;
    let app = gated_router(client_for(addr));

    // WHEN: Requesting with credential headers instead of a token
    let response = app
        .oneshot(get_with(
            "/quad/ping",
            &[("X-Username", DEMO_USERNAME), ("X-Password", DEMO_PASSWORD)],
        ))
        .await
        .expect("request");

    // THEN: Handler ran and no session is left behind
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "pong");
    assert!(server.engine().store().is_empty());
    server.stop().await;
}

#[tokio::test]
async fn given_wrong_credential_headers_when_request_protected_route_then_401() {
    let (mut server, addr) = start_test_server().await;
    let app = gated_router(client_for(addr));

    let response = app
        .oneshot(get_with(
            "/quad/ping",
            &[("X-Username", DEMO_USERNAME), ("X-Password", "wrong")],
        ))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_text(response).await,
        "Unauthorized: invalid credentials."
    );
    server.stop().await;
}

/// **VALUE**: Verifies only one credential header is treated as no credentials.
#[tokio::test]
async fn given_username_only_when_request_protected_route_then_401_missing_token() {
    let (mut server, addr) = start_test_server().await;
    let app = gated_router(client_for(addr));

    let response = app
        .oneshot(get_with("/quad/ping", &[("X-Username", DEMO_USERNAME)]))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_text(response).await.starts_with("Missing token."));
    server.stop().await;
}

#[tokio::test]
async fn given_service_down_when_request_with_credential_headers_then_503() {
    let app = gated_router(client_for(unused_addr().await));

    let response = app
        .oneshot(get_with(
            "/quad/ping",
            &[("X-Username", DEMO_USERNAME), ("X-Password", DEMO_PASSWORD)],
        ))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
