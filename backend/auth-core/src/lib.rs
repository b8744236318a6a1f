pub mod client;
pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod protocol;
pub mod server;
pub mod token_store;
pub mod web;

#[cfg(test)]
mod tests;

pub use client::{AuthClient, SocketAuthClient};
pub use config::AuthConfig;
pub use credentials::{CredentialCheck, DemoCredentials};
pub use engine::AuthEngine;
pub use server::AuthServer;
pub use token_store::TokenStore;
pub use web::{WebState, build_router};
