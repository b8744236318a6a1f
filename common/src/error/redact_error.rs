use crate::ErrorLocation;

use thiserror::Error as ThisError;

/// Raised when code tries to serialize a redacted value.
#[derive(Debug, ThisError)]
pub enum RedactError {
    #[error("Redacted Serialization Error: {type_name} must be exposed explicitly {location}")]
    Serialization {
        type_name: &'static str,
        location: ErrorLocation,
    },
}

impl RedactError {
    #[track_caller]
    pub fn serialization(type_name: &'static str) -> Self {
        RedactError::Serialization {
            type_name,
            location: ErrorLocation::caller(),
        }
    }
}
