use gateway::app::{Gateway, bind_http};
use gateway::error::GatewayError;
use gateway::logger::{LogTarget, initialize as LoggerInitialize};

use auth_core::config::AuthConfig;

use common::ErrorLocation;

use std::env;
use std::fs::create_dir_all;
use std::panic::Location;
use std::path::PathBuf;

use log::{error, info};

/// Directory holding `auth.toml` (defaults to the working directory).
const ENV_CONFIG_DIR: &str = "GATEWAY_CONFIG_DIR";

/// Directory for `gateway.log` (defaults to `<config dir>/logs`).
const ENV_LOG_DIR: &str = "GATEWAY_LOG_DIR";

#[tokio::main]
async fn main() -> Result<(), GatewayError> {
    let config_dir = match env::var_os(ENV_CONFIG_DIR) {
        Some(dir) => PathBuf::from(dir),
        None => env::current_dir().map_err(|e| GatewayError::Gateway {
            message: format!("Failed to resolve working directory: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?,
    };
    let log_dir = env::var_os(ENV_LOG_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir.join("logs"));

    create_dir_all(&log_dir).map_err(|e| GatewayError::Gateway {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Logger first, so config problems are recorded
    LoggerInitialize(LogTarget::server(&log_dir))?;

    info!("Gateway starting");
    info!("Config directory: {}", config_dir.display());
    info!("Log directory: {}", log_dir.display());

    let config = AuthConfig::load(&config_dir).map_err(|e| GatewayError::Config {
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let http_listener = bind_http(&config).await?;

    let mut gateway = Gateway::new(config);
    gateway.start_auth_server().await?;

    let result = gateway.serve(http_listener, shutdown_signal()).await;
    if let Err(e) = &result {
        error!("{e}");
    }
    info!("Gateway stopped");
    result
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, shutting down"),
        Err(e) => error!("Failed to listen for Ctrl-C, shutting down: {e}"),
    }
}
