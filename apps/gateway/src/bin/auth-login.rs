//! Interactive login against the auth socket server.
//!
//! Prompts for a username and password, sends them over the line protocol
//! and prints the token. Exits non-zero when the service cannot be reached.

use gateway::error::GatewayError;
use gateway::logger::{LogTarget, initialize as LoggerInitialize};

use auth_core::config::AuthConfig;
use auth_core::{AuthClient, SocketAuthClient};

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::process::ExitCode;

use log::{info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, stdin, stdout};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ GatewayError::Client { .. }) => {
            eprintln!("Connection error: {e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), GatewayError> {
    let work_dir = env::current_dir().map_err(|e| GatewayError::Gateway {
        message: format!("Failed to resolve working directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    if let Err(e) = LoggerInitialize(LogTarget::client(&env::temp_dir())) {
        eprintln!("Logging disabled: {e}");
    }

    let config = AuthConfig::load(&work_dir).map_err(|e| GatewayError::Config {
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })?;
    let client = SocketAuthClient::from_config(&config.socket);
    info!("Connecting to auth server at {}", client.address());

    let mut input = BufReader::new(stdin()).lines();
    let username = prompt(&mut input, "Enter username: ").await?;
    let password = prompt(&mut input, "Enter password: ").await?;

    let token = client
        .authenticate(&username, &password)
        .await
        .map_err(|e| GatewayError::Client {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

    match token {
        Some(token) => {
            println!("Authentication successful. Token: {token}");
            info!("Authentication token received for '{username}'");
        }
        None => {
            println!("Authentication failed.");
            warn!("No token received for '{username}'");
        }
    }
    Ok(())
}

/// Print `label` and read one line; EOF reads as empty.
async fn prompt(input: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<String, GatewayError> {
    let io_error = |e: std::io::Error| GatewayError::Gateway {
        message: format!("Failed to read from terminal: {e}"),
        location: ErrorLocation::from(Location::caller()),
    };

    let mut out = stdout();
    out.write_all(label.as_bytes()).await.map_err(io_error)?;
    out.flush().await.map_err(io_error)?;

    Ok(input.next_line().await.map_err(io_error)?.unwrap_or_default())
}
