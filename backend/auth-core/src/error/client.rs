use common::ErrorLocation;

use std::io::Error as IoError;
use std::time::Duration;

use thiserror::Error as ThisError;

/// Failures talking to the protocol server.
///
/// Every variant means "the service could not be asked", never "the answer was
/// no". Callers map these to 503, while a `false` reply maps to 401.
#[derive(Debug, ThisError)]
pub enum ClientError {
    #[error("Connect Error: {address}: {message} {location}")]
    Connect {
        address: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Timeout Error: {operation} exceeded {timeout:?} {location}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
        location: ErrorLocation,
    },

    #[error("IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
    },

    #[error("Closed Error: server closed the connection before replying {location}")]
    Closed { location: ErrorLocation },
}

impl ClientError {
    #[track_caller]
    pub fn connect(address: impl Into<String>, error: &IoError) -> Self {
        ClientError::Connect {
            address: address.into(),
            message: error.to_string(),
            location: ErrorLocation::caller(),
        }
    }

    #[track_caller]
    pub fn timeout(operation: &'static str, timeout: Duration) -> Self {
        ClientError::Timeout {
            operation,
            timeout,
            location: ErrorLocation::caller(),
        }
    }

    #[track_caller]
    pub fn closed() -> Self {
        ClientError::Closed {
            location: ErrorLocation::caller(),
        }
    }

    /// Short category label for logs.
    pub fn error_category(&self) -> &'static str {
        match self {
            ClientError::Connect { .. } => "connect",
            ClientError::Timeout { .. } => "timeout",
            ClientError::Io { .. } => "io",
            ClientError::Closed { .. } => "closed",
        }
    }
}

impl From<IoError> for ClientError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        ClientError::Io {
            message: error.to_string(),
            location: ErrorLocation::caller(),
        }
    }
}
