//! `/auth` endpoints: login, validate and logout over HTTP.
//!
//! Each endpoint forwards to the protocol server through the [`AuthClient`]
//! and maps its answer to a status code:
//! negative answer → 401, transport failure → 503.
//!
//! [`AuthClient`]: crate::client::AuthClient

use crate::web::WebState;

use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use log::{debug, error, info, warn};
use serde::Deserialize;

pub const AUTHENTICATE_PATH: &str = "/auth/authenticate";
pub const VALIDATE_PATH: &str = "/auth/validate";
pub const LOGOUT_PATH: &str = "/auth/logout";

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub fn auth_routes(state: WebState) -> Router {
    Router::new()
        .route(AUTHENTICATE_PATH, post(authenticate))
        .route(VALIDATE_PATH, get(validate))
        .route(LOGOUT_PATH, post(logout))
        .with_state(state)
}

/// Credentials come from a form body, or from the query string when there is
/// no form body.
async fn authenticate(
    State(state): State<WebState>,
    uri: Uri,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let login = match form {
        Ok(Form(login)) => login,
        Err(rejection) => match Query::<LoginForm>::try_from_uri(&uri) {
            Ok(Query(login)) => login,
            Err(_) => {
                debug!("Login request without credentials: {rejection}");
                return (StatusCode::BAD_REQUEST, "Missing username or password").into_response();
            }
        },
    };

    match state.client.authenticate(&login.username, &login.password).await {
        Ok(Some(token)) => {
            info!("Token generated for user '{}'", login.username);
            (StatusCode::OK, token).into_response()
        }
        Ok(None) => {
            warn!("Invalid credentials for user '{}'", login.username);
            (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response()
        }
        Err(e) => {
            error!("Socket error during authentication: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "Socket auth failed.").into_response()
        }
    }
}

async fn validate(State(state): State<WebState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = state.token_from(&headers) else {
        return missing_token(&state);
    };

    match state.client.validate_token(&token).await {
        Ok(true) => (StatusCode::OK, "Token is valid".to_string()),
        Ok(false) => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
        Err(e) => {
            error!("Socket error during token validation: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Socket validation failed.".to_string(),
            )
        }
    }
}

async fn logout(State(state): State<WebState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = state.token_from(&headers) else {
        return missing_token(&state);
    };

    match state.client.revoke_token(&token).await {
        Ok(true) => {
            info!("Token revoked via socket.");
            (StatusCode::OK, "Logged out successfully".to_string())
        }
        Ok(false) => {
            warn!("Failed to revoke token");
            (StatusCode::UNAUTHORIZED, "Invalid token".to_string())
        }
        Err(e) => {
            error!("Socket logout failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Logout service unavailable".to_string(),
            )
        }
    }
}

fn missing_token(state: &WebState) -> (StatusCode, String) {
    (
        StatusCode::UNAUTHORIZED,
        format!("Missing token. Provide {} header.", state.config().header_token),
    )
}
