use common::ErrorLocation;

use std::io::Error as IoError;
use std::net::SocketAddr;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ServerError {
    #[error("Bind Error: {address}: {message} {location}")]
    Bind {
        address: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Read Error: {peer}: {message} {location}")]
    Read {
        peer: SocketAddr,
        message: String,
        location: ErrorLocation,
    },

    #[error("Send Error: {peer}: {message} {location}")]
    Send {
        peer: SocketAddr,
        message: String,
        location: ErrorLocation,
    },
}

impl ServerError {
    #[track_caller]
    pub fn bind(address: impl Into<String>, error: &IoError) -> Self {
        ServerError::Bind {
            address: address.into(),
            message: error.to_string(),
            location: ErrorLocation::caller(),
        }
    }

    #[track_caller]
    pub fn read(peer: SocketAddr, error: &IoError) -> Self {
        ServerError::Read {
            peer,
            message: error.to_string(),
            location: ErrorLocation::caller(),
        }
    }

    #[track_caller]
    pub fn send(peer: SocketAddr, error: &IoError) -> Self {
        ServerError::Send {
            peer,
            message: error.to_string(),
            location: ErrorLocation::caller(),
        }
    }
}
