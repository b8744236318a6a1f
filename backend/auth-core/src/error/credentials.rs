use common::ErrorLocation;

use thiserror::Error as ThisError;

/// A credential backend could not answer. Distinct from "wrong password",
/// which is `Ok(false)`.
#[derive(Debug, ThisError)]
pub enum CredentialError {
    #[error("Credential Backend Error: {message} {location}")]
    Backend {
        message: String,
        location: ErrorLocation,
    },
}

impl CredentialError {
    #[track_caller]
    pub fn backend(message: impl Into<String>) -> Self {
        CredentialError::Backend {
            message: message.into(),
            location: ErrorLocation::caller(),
        }
    }
}
