//! TCP protocol server.
//!
//! One listening socket, serial `accept`, one tokio task per connection. The
//! server owns its accept task and all connection tasks; [`AuthServer::stop`]
//! cancels and joins them, so nothing outlives the server.
//!
//! # Lifecycle
//!
//! - [`AuthServer::start`] binds and starts accepting. It does nothing when
//!   the configuration disables the socket.
//! - [`AuthServer::stop`] is idempotent and safe before `start`.

pub(crate) mod connection;
mod handle;

use crate::config::SocketConfig;
use crate::engine::AuthEngine;
use crate::error::ServerError;

use connection::handle_connection;
use handle::ServerHandle;

use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Pause after a failed `accept` (e.g. out of file descriptors) before retrying.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

pub struct AuthServer {
    config: SocketConfig,
    engine: AuthEngine,
    handle: Option<ServerHandle>,
}

impl AuthServer {
    pub fn new(config: SocketConfig, engine: AuthEngine) -> Self {
        info!(
            "AuthServer initialized with host={}, port={}, enabled={}",
            config.host, config.port, config.enabled
        );
        Self {
            config,
            engine,
            handle: None,
        }
    }

    /// Bind the listening socket and start accepting connections.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(addr))` with the bound address (useful with port 0)
    /// - `Ok(None)` if the socket is disabled by configuration
    ///
    /// Calling `start` on a running server returns its current address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound (port in
    /// use, permission denied, bad host).
    pub async fn start(&mut self) -> Result<Option<SocketAddr>, ServerError> {
        if !self.config.enabled {
            info!("AuthServer is disabled via configuration.");
            return Ok(None);
        }

        if let Some(handle) = &self.handle {
            warn!("AuthServer already running on {}", handle.local_addr());
            return Ok(Some(handle.local_addr()));
        }

        let address = self.config.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| ServerError::bind(&address, &e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::bind(&address, &e))?;

        info!("Auth socket server started on {local_addr}");

        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();
        let accept_task = tokio::spawn(accept_loop(
            listener,
            self.engine.clone(),
            cancel.clone(),
            tracker.clone(),
        ));

        self.handle = Some(ServerHandle::new(local_addr, cancel, tracker, accept_task));
        Ok(Some(local_addr))
    }

    /// Stop accepting, terminate open connections and drop all sessions.
    pub async fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            debug!("AuthServer stop requested but it is not running");
            return;
        };

        info!("Stopping AuthServer on {}...", handle.local_addr());
        handle.shutdown().await;
        self.engine.store().clear();
        info!("AuthServer stopped.");
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.handle.as_ref().map(ServerHandle::local_addr)
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn engine(&self) -> &AuthEngine {
        &self.engine
    }
}

async fn accept_loop(
    listener: TcpListener,
    engine: AuthEngine,
    cancel: CancellationToken,
    tracker: TaskTracker,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Accept loop cancelled, closing listener");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("Accepted connection from {peer}");
                    let engine = engine.clone();
                    let cancel = cancel.clone();

                    tracker.spawn(async move {
                        tokio::select! {
                            _ = cancel.cancelled() => {
                                warn!("Connection with {peer} terminated by shutdown");
                            }
                            result = handle_connection(stream, peer, engine) => {
                                if let Err(e) = result {
                                    error!("Error handling client {peer}: {e}");
                                }
                            }
                        }
                        debug!("Closed connection with {peer}");
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {e}");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            }
        }
    }
}
