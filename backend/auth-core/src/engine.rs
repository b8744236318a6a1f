//! Authentication engine: credential check + token store.

use crate::credentials::CredentialCheck;
use crate::error::CredentialError;
use crate::token_store::TokenStore;

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use log::{error, info, warn};

/// Implements login, token validation and logout on top of a
/// [`CredentialCheck`] and a shared [`TokenStore`].
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct AuthEngine {
    credentials: Arc<dyn CredentialCheck>,
    store: Arc<TokenStore>,
}

impl AuthEngine {
    pub fn new(credentials: Arc<dyn CredentialCheck>, store: Arc<TokenStore>) -> Self {
        Self { credentials, store }
    }

    /// Check the pair and, on success, issue a fresh token.
    ///
    /// Returns `None` when the credentials are rejected, when the credential
    /// backend fails or panics, or when no unique token could be generated. The
    /// store is untouched in all of these cases.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<String> {
        info!("Attempting authentication for user: '{username}'");

        match self.check_credentials(username, password) {
            Ok(true) => {}
            Ok(false) => {
                info!("Authentication failed for user: '{username}'");
                return None;
            }
            Err(e) => {
                error!("Credential backend failure for user '{username}': {e}");
                return None;
            }
        }

        match self.store.issue(username) {
            Ok(token) => {
                info!("Authentication successful for user: '{username}'");
                Some(token)
            }
            Err(e) => {
                error!("Could not issue token for user '{username}': {e}");
                None
            }
        }
    }

    /// Run the credential check, turning a panic into a backend error.
    fn check_credentials(&self, username: &str, password: &str) -> Result<bool, CredentialError> {
        catch_unwind(AssertUnwindSafe(|| self.credentials.check(username, password)))
            .unwrap_or_else(|payload| {
                Err(CredentialError::backend(format!(
                    "credential check panicked: {}",
                    panic_message(&*payload)
                )))
            })
    }

    pub fn is_token_valid(&self, token: &str) -> bool {
        self.store.contains(token)
    }

    /// Revoke `token`. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) {
        match self.store.revoke(token) {
            Some(username) => info!("User '{username}' logged out"),
            None => warn!("Logout attempted for unknown token"),
        }
    }

    pub fn username_for_token(&self, token: &str) -> Option<String> {
        self.store.username_for(token)
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
