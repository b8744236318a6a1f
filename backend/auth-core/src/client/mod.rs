//! Client side of the line protocol.
//!
//! [`AuthClient`] is the capability the HTTP layer depends on;
//! [`SocketAuthClient`] is its TCP implementation. Every call opens a fresh
//! connection, bounded by a connect timeout and a read timeout, and the
//! stream is dropped (closed) on every exit path.

use crate::config::SocketConfig;
use crate::error::ClientError;
use crate::protocol::{self, Request};

use common::RedactedSecret;

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// The three operations of the authentication service.
///
/// `Err` always means the service could not be reached or did not answer;
/// a negative answer is `Ok(None)` / `Ok(false)`.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Log in; `Ok(Some(token))` on success, `Ok(None)` if rejected.
    async fn authenticate(&self, username: &str, password: &str)
    -> Result<Option<String>, ClientError>;

    async fn validate_token(&self, token: &str) -> Result<bool, ClientError>;

    async fn revoke_token(&self, token: &str) -> Result<bool, ClientError>;
}

/// Raw reply lines from one exchange.
struct ReplyLines {
    status: String,
    token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SocketAuthClient {
    address: String,
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl SocketAuthClient {
    pub fn new(address: impl Into<String>, connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
            read_timeout,
        }
    }

    pub fn from_config(config: &SocketConfig) -> Self {
        Self::new(
            config.address(),
            config.connect_timeout(),
            config.read_timeout(),
        )
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Connect, send `request`, read the status line and (for logins) the
    /// token line.
    async fn exchange(&self, request: &Request) -> Result<ReplyLines, ClientError> {
        let stream = timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| ClientError::timeout("connect", self.connect_timeout))?
            .map_err(|e| ClientError::connect(&self.address, &e))?;

        let expects_token = matches!(request, Request::Login { .. });

        timeout(self.read_timeout, async move {
            let mut stream = BufReader::new(stream);

            stream.write_all(request.encode().as_bytes()).await?;
            stream.flush().await?;

            let status = protocol::read_line(&mut stream)
                .await?
                .ok_or_else(|| ClientError::closed())?;

            let token = if expects_token {
                protocol::read_line(&mut stream).await?
            } else {
                None
            };

            Ok::<ReplyLines, ClientError>(ReplyLines { status, token })
        })
        .await
        .map_err(|_| ClientError::timeout("read", self.read_timeout))?
    }
}

#[async_trait]
impl AuthClient for SocketAuthClient {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<String>, ClientError> {
        let request = Request::Login {
            username: username.to_string(),
            password: RedactedSecret::new(password),
        };
        if !request.is_encodable() {
            debug!("Refusing to send credentials containing line breaks");
            return Ok(None);
        }

        let reply = self.exchange(&request).await?;
        debug!("Socket auth result for '{username}': {}", reply.status);

        if !protocol::parse_bool(&reply.status) {
            return Ok(None);
        }
        Ok(protocol::parse_login_token(reply.token.as_deref()))
    }

    async fn validate_token(&self, token: &str) -> Result<bool, ClientError> {
        let request = Request::TokenCheck {
            token: token.to_string(),
        };
        if !request.is_encodable() {
            debug!("Token contains line breaks, treating as invalid");
            return Ok(false);
        }

        let reply = self.exchange(&request).await?;
        let valid = protocol::parse_bool(&reply.status);
        debug!("Socket token check result: {valid}");
        Ok(valid)
    }

    async fn revoke_token(&self, token: &str) -> Result<bool, ClientError> {
        let request = Request::TokenRevoke {
            token: token.to_string(),
        };
        if !request.is_encodable() {
            debug!("Token contains line breaks, nothing to revoke");
            return Ok(false);
        }

        let reply = self.exchange(&request).await?;
        let revoked = protocol::parse_bool(&reply.status);
        debug!("Token revoke result: {revoked}");
        Ok(revoked)
    }
}
