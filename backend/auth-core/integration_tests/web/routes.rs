use crate::helpers::{client_for, gated_router, start_test_server, unused_addr};

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
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

fn login_request(username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/auth/authenticate")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}&password={password}")))
        .expect("Failed to build request")
}

fn token_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("X-Auth-Token", token);
    }
    builder.body(Body::empty()).expect("Failed to build request")
}

// ============================================================================
// /auth endpoints
// ============================================================================

/// **VALUE**: Verifies the HTTP login/validate/logout cycle end to end.
///
/// **WHY THIS MATTERS**: These endpoints are how browsers and scripts obtain and
/// discard tokens without speaking the line protocol.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Login returns something other than the bare token
/// - Logout does not actually revoke
/// - `/auth/*` is accidentally gated
#[tokio::test]
async fn given_running_service_when_login_validate_logout_then_statuses_follow() {
    // GIVEN: Router and service
    let (mut server, addr) = start_test_server().await;
    let app = gated_router(client_for(addr));

    // WHEN: Logging in
    let login = app
        .clone()
        .oneshot(login_request("admin", "password123"))
        .await
        .expect("request");
    assert_eq!(login.status(), StatusCode::OK);
    let token = body_text(login).await;
    assert!(server.engine().is_token_valid(&token));

    // THEN: Validate succeeds
    let validate = app
        .clone()
        .oneshot(token_request("GET", "/auth/validate", Some(&token)))
        .await
        .expect("request");
    assert_eq!(validate.status(), StatusCode::OK);
    assert_eq!(body_text(validate).await, "Token is valid");

    // THEN: Logout succeeds and the token is gone
    let logout = app
        .clone()
        .oneshot(token_request("POST", "/auth/logout", Some(&token)))
        .await
        .expect("request");
    assert_eq!(logout.status(), StatusCode::OK);
    assert_eq!(body_text(logout).await, "Logged out successfully");

    let revalidate = app
        .oneshot(token_request("GET", "/auth/validate", Some(&token)))
        .await
        .expect("request");
    assert_eq!(revalidate.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(revalidate).await, "Invalid token");

    server.stop().await;
}

#[tokio::test]
async fn given_wrong_password_when_login_then_401_invalid_credentials() {
    let (mut server, addr) = start_test_server().await;
    let app = gated_router(client_for(addr));

    let response = app
        .oneshot(login_request("admin", "wrong"))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "Invalid credentials");
    server.stop().await;
}

#[tokio::test]
async fn given_no_token_header_when_validate_then_401() {
    let (mut server, addr) = start_test_server().await;
    let app = gated_router(client_for(addr));

    let response = app
        .oneshot(token_request("GET", "/auth/validate", None))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    server.stop().await;
}

/// **VALUE**: Verifies every `/auth` endpoint answers 503 when the service is down.
#[tokio::test]
async fn given_service_down_when_calling_auth_endpoints_then_503_each() {
    let app = gated_router(client_for(unused_addr().await));

    let login = app
        .clone()
        .oneshot(login_request("admin", "password123"))
        .await
        .expect("request");
    let validate = app
        .clone()
        .oneshot(token_request("GET", "/auth/validate", Some("t")))
        .await
        .expect("request");
    let logout = app
        .oneshot(token_request("POST", "/auth/logout", Some("t")))
        .await
        .expect("request");

    assert_eq!(login.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_text(login).await, "Socket auth failed.");
    assert_eq!(validate.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_text(validate).await, "Socket validation failed.");
    assert_eq!(logout.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_text(logout).await, "Logout service unavailable");
}

/// **VALUE**: Verifies credentials are also accepted as query parameters.
#[tokio::test]
async fn given_query_credentials_when_login_then_200_with_token() {
    let (mut server, addr) = start_test_server().await;
    let app = gated_router(client_for(addr));

    let response = app
        .oneshot(token_request(
            "POST",
            "/auth/authenticate?username=admin&password=password123",
            None,
        ))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::OK);
    let token = body_text(response).await;
    assert!(server.engine().is_token_valid(&token));
    server.stop().await;
}

#[tokio::test]
async fn given_no_credentials_when_login_then_400() {
    let app = gated_router(client_for(unused_addr().await));

    let response = app
        .oneshot(token_request("POST", "/auth/authenticate", None))
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
