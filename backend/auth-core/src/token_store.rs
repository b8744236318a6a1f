//! In-memory token → username map.
//!
//! Backed by a sharded concurrent map, so validations never wait on each
//! other and a write only locks the shard it touches. The store is created
//! once per service and injected where needed; nothing here is global.

use crate::error::TokenStoreError;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::{debug, warn};
use uuid::Uuid;

/// How many fresh tokens to try before giving up on a collision.
pub const MAX_ISSUE_ATTEMPTS: usize = 3;

#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: DashMap<String, String>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a new token bound to `username`.
    ///
    /// An existing token is never overwritten: on collision a new value is
    /// generated, up to [`MAX_ISSUE_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError::Collision`] if every attempt collided.
    pub fn issue(&self, username: &str) -> Result<String, TokenStoreError> {
        self.issue_with(username, || Uuid::new_v4().to_string())
    }

    pub(crate) fn issue_with<G>(&self, username: &str, mut generate: G) -> Result<String, TokenStoreError>
    where
        G: FnMut() -> String,
    {
        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let token = generate();
            match self.tokens.entry(token) {
                Entry::Vacant(slot) => {
                    let token = slot.key().clone();
                    slot.insert(username.to_string());
                    debug!("Issued token for '{username}' (attempt {attempt})");
                    return Ok(token);
                }
                Entry::Occupied(_) => {
                    warn!("Generated token collided with a live session (attempt {attempt})");
                }
            }
        }

        Err(TokenStoreError::collision(MAX_ISSUE_ATTEMPTS))
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains_key(token)
    }

    pub fn username_for(&self, token: &str) -> Option<String> {
        self.tokens.get(token).map(|entry| entry.value().clone())
    }

    /// Remove `token`, returning the username it belonged to.
    pub fn revoke(&self, token: &str) -> Option<String> {
        self.tokens.remove(token).map(|(_, username)| username)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Drop every session.
    pub fn clear(&self) {
        self.tokens.clear();
    }
}
