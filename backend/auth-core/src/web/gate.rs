//! Token gate middleware.
//!
//! Requests under the protected prefix need a valid token header. Everything
//! else passes straight through.
//!
//! | situation                         | response |
//! |-----------------------------------|----------|
//! | token header missing / blank      | 401      |
//! | service says token is invalid     | 401      |
//! | service unreachable / timed out   | 503      |
//! | token valid                       | request forwarded unmodified |
//!
//! If the token header is missing but both credential headers are present,
//! the gate logs in with them, forwards the request and revokes the one-shot
//! token afterwards.

use crate::web::{WebState, non_blank_header};

use common::RedactedSecret;

use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::{debug, warn};

pub async fn gate_middleware(
    State(state): State<WebState>,
    request: Request,
    next: Next,
) -> Result<Response, GateRejection> {
    if !state.is_protected(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let headers = request.headers();

    if let Some(token) = state.token_from(headers) {
        return match state.client.validate_token(&token).await {
            Ok(true) => Ok(next.run(request).await),
            Ok(false) => Err(GateRejection::invalid_token()),
            Err(e) => {
                warn!("Token validation error ({}): {e}", e.error_category());
                Err(GateRejection::unavailable())
            }
        };
    }

    let config = state.config();
    let username = non_blank_header(headers, &config.header_username);
    let password = non_blank_header(headers, &config.header_password).map(RedactedSecret::new);

    let (Some(username), Some(password)) = (username, password) else {
        return Err(GateRejection::missing_token(&config.header_token));
    };

    match state
        .client
        .authenticate(&username, password.expose())
        .await
    {
        Ok(Some(token)) => {
            let response = next.run(request).await;
            match state.client.revoke_token(&token).await {
                Ok(_) => debug!("Revoked one-shot token for '{username}'"),
                Err(e) => warn!("Failed to revoke one-shot token for '{username}': {e}"),
            }
            Ok(response)
        }
        Ok(None) => Err(GateRejection::invalid_credentials()),
        Err(e) => {
            warn!("Credential header login error ({}): {e}", e.error_category());
            Err(GateRejection::unavailable())
        }
    }
}

/// Plain-text rejection emitted by the gate.
#[derive(Debug)]
pub struct GateRejection {
    status: StatusCode,
    message: String,
}

impl GateRejection {
    fn missing_token(header_name: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: format!("Missing token. Provide {header_name} header."),
        }
    }

    fn invalid_token() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Invalid token.".to_string(),
        }
    }

    fn invalid_credentials() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "Unauthorized: invalid credentials.".to_string(),
        }
    }

    fn unavailable() -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "Authentication service unavailable.".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message,
        )
            .into_response()
    }
}
