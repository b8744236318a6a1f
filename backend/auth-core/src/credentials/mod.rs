//! Credential checking.
//!
//! The service never stores credentials; it only asks a [`CredentialCheck`]
//! whether a username/password pair is acceptable. `Ok(false)` means the pair
//! was rejected. `Err(_)` means the backend could not answer, which callers
//! still treat as a failed login but log differently.

use crate::config::DemoCredentialsConfig;
use crate::error::CredentialError;

use common::RedactedSecret;

/// Capability to decide whether a username/password pair is valid.
pub trait CredentialCheck: Send + Sync {
    fn check(&self, username: &str, password: &str) -> Result<bool, CredentialError>;
}

impl<F> CredentialCheck for F
where
    F: Fn(&str, &str) -> Result<bool, CredentialError> + Send + Sync,
{
    fn check(&self, username: &str, password: &str) -> Result<bool, CredentialError> {
        self(username, password)
    }
}

/// A single fixed username/password pair, for demos and tests.
#[derive(Debug, Clone)]
pub struct DemoCredentials {
    username: String,
    password: RedactedSecret,
}

impl DemoCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<RedactedSecret>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl From<&DemoCredentialsConfig> for DemoCredentials {
    fn from(config: &DemoCredentialsConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

impl CredentialCheck for DemoCredentials {
    fn check(&self, username: &str, password: &str) -> Result<bool, CredentialError> {
        Ok(username == self.username && password == self.password.expose())
    }
}
