use std::path::PathBuf;

use common::ErrorLocation;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config Read Error: {path}: {source} {location}")]
    ReadError {
        location: ErrorLocation,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config Parse Error: {path}: {reason} {location}")]
    ParseError {
        location: ErrorLocation,
        path: PathBuf,
        reason: String,
    },

    #[error("Config Env Error: {variable}: {reason} {location}")]
    EnvError {
        location: ErrorLocation,
        variable: String,
        reason: String,
    },

    #[error("Config Validation Error: {reason} {location}")]
    ValidationError {
        location: ErrorLocation,
        reason: String,
    },
}

impl ConfigError {
    #[track_caller]
    pub fn validation(reason: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            location: ErrorLocation::caller(),
            reason: reason.into(),
        }
    }

    #[track_caller]
    pub fn env(variable: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::EnvError {
            location: ErrorLocation::caller(),
            variable: variable.into(),
            reason: reason.into(),
        }
    }
}
