pub mod client;
pub mod config;
pub mod credentials;
pub mod server;
pub mod token_store;

pub use client::ClientError;
pub use config::ConfigError;
pub use credentials::CredentialError;
pub use server::ServerError;
pub use token_store::TokenStoreError;
