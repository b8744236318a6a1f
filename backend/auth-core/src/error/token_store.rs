use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum TokenStoreError {
    #[error("Token Collision Error: no unique token after {attempts} attempts {location}")]
    Collision {
        attempts: usize,
        location: ErrorLocation,
    },
}

impl TokenStoreError {
    #[track_caller]
    pub fn collision(attempts: usize) -> Self {
        TokenStoreError::Collision {
            attempts,
            location: ErrorLocation::caller(),
        }
    }
}
