use common::ErrorLocation;

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the gateway binaries.
///
/// Library errors are flattened to messages here; the location records where
/// the gateway observed them.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayError {
    /// Error from this app (logger, directories)
    #[error("Gateway Error: {message} {location}")]
    Gateway {
        message: String,
        location: ErrorLocation,
    },

    /// Configuration could not be loaded or validated
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// The protocol server failed to start
    #[error("Auth Server Error: {message} {location}")]
    AuthServer {
        message: String,
        location: ErrorLocation,
    },

    /// The HTTP listener failed to bind or serve
    #[error("Http Error: {message} {location}")]
    Http {
        message: String,
        location: ErrorLocation,
    },

    /// The interactive client could not reach the service
    #[error("Client Error: {message} {location}")]
    Client {
        message: String,
        location: ErrorLocation,
    },
}
