//! HTTP side: the token gate middleware and the `/auth` endpoints.
//!
//! Both talk to the protocol server exclusively through an [`AuthClient`];
//! nothing here touches the token store directly.

mod gate;
mod routes;

pub use gate::{GateRejection, gate_middleware};
pub use routes::auth_routes;

use crate::client::AuthClient;
use crate::config::GateConfig;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderMap;
use axum::middleware;

/// Shared state for the gate and the auth routes.
#[derive(Clone)]
pub struct WebState {
    client: Arc<dyn AuthClient>,
    config: Arc<GateConfig>,
}

impl WebState {
    pub fn new(client: Arc<dyn AuthClient>, config: GateConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Whether `path` must carry a valid token.
    ///
    /// A blank protected prefix disables gating. Exempt prefixes win over the
    /// protected prefix.
    pub fn is_protected(&self, path: &str) -> bool {
        let prefix = self.config.protected_path_prefix.as_str();
        if prefix.trim().is_empty() {
            return false;
        }
        if self
            .config
            .exempt_path_prefixes
            .iter()
            .any(|exempt| path.starts_with(exempt.as_str()))
        {
            return false;
        }
        path.starts_with(prefix)
    }

    /// Non-blank value of the configured token header.
    pub(crate) fn token_from(&self, headers: &HeaderMap) -> Option<String> {
        non_blank_header(headers, &self.config.header_token)
    }
}

fn non_blank_header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

/// Merge the `/auth` endpoints into `app_routes` and put the whole router
/// behind the gate.
pub fn build_router(state: WebState, app_routes: Router) -> Router {
    app_routes
        .merge(auth_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, gate_middleware))
}
