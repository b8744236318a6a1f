//! Wiring for the gateway: protocol server, socket client and HTTP router.

use crate::error::GatewayError;

use auth_core::config::AuthConfig;
use auth_core::{
    AuthEngine, AuthServer, DemoCredentials, SocketAuthClient, TokenStore, WebState, build_router,
};

use common::ErrorLocation;

use std::future::Future;
use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use log::{info, warn};
use tokio::net::TcpListener;

pub const PING_RESPONSE: &str = "ok";

/// One gateway instance: owns the protocol server and builds the HTTP side
/// around it.
pub struct Gateway {
    config: AuthConfig,
    server: AuthServer,
}

impl Gateway {
    /// Build the demo credential check, token store, engine and protocol server.
    /// Nothing is bound yet.
    pub fn new(config: AuthConfig) -> Self {
        let credentials = DemoCredentials::from(&config.demo);
        info!("Demo credentials configured for user '{}'", credentials.username());

        let engine = AuthEngine::new(Arc::new(credentials), Arc::new(TokenStore::new()));
        let server = AuthServer::new(config.socket.clone(), engine);

        Self { config, server }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn auth_server(&self) -> &AuthServer {
        &self.server
    }

    /// Start the protocol server.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AuthServer`] if the listener cannot be bound.
    pub async fn start_auth_server(&mut self) -> Result<Option<SocketAddr>, GatewayError> {
        let bound = self
            .server
            .start()
            .await
            .map_err(|e| GatewayError::AuthServer {
                message: format!("Failed to start auth socket server: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;

        if bound.is_none() {
            warn!(
                "Local auth socket server disabled; gate will use {}",
                self.config.socket.address()
            );
        }
        Ok(bound)
    }

    /// Socket client aimed at the running server, or at the configured address
    /// when the local server is not running.
    pub fn auth_client(&self) -> SocketAuthClient {
        match self.server.local_addr() {
            Some(addr) => SocketAuthClient::new(
                addr.to_string(),
                self.config.socket.connect_timeout(),
                self.config.socket.read_timeout(),
            ),
            None => SocketAuthClient::from_config(&self.config.socket),
        }
    }

    /// Auth endpoints plus the demo protected route, all behind the gate.
    pub fn router(&self) -> Router {
        let state = WebState::new(Arc::new(self.auth_client()), self.config.gate.clone());
        build_router(state, app_routes(&self.config.gate.protected_path_prefix))
    }

    /// Serve HTTP on `listener` until `shutdown` resolves, then stop the
    /// protocol server.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the HTTP server fails. The protocol
    /// server is stopped either way.
    pub async fn serve<F>(mut self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        if let Ok(addr) = listener.local_addr() {
            info!("HTTP gateway listening on {addr}");
        }

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::Http {
                message: format!("HTTP server failed: {e}"),
                location: ErrorLocation::from(Location::caller()),
            });

        self.server.stop().await;
        served
    }
}

/// Application routes behind the gate: `<prefix>/ping`.
pub fn app_routes(protected_prefix: &str) -> Router {
    let ping_path = format!("{}/ping", protected_prefix.trim_end_matches('/'));
    Router::new().route(&ping_path, get(|| async { PING_RESPONSE }))
}

/// Bind the HTTP listener for `config.http`.
///
/// # Errors
///
/// Returns [`GatewayError::Http`] if the address cannot be bound.
pub async fn bind_http(config: &AuthConfig) -> Result<TcpListener, GatewayError> {
    let address = config.http.address();
    TcpListener::bind(&address)
        .await
        .map_err(|e| GatewayError::Http {
            message: format!("Failed to bind HTTP listener on {address}: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
}
