//! Per-connection state machine.
//!
//! `AwaitLine1 -> AwaitLine2 -> Dispatch -> Reply -> Closed`. Every path ends
//! in `Closed`; EOF or a malformed line in either await state jumps straight
//! to `Reply(Malformed)`.

use crate::engine::AuthEngine;
use crate::error::ServerError;
use crate::protocol::{self, Reply, Request};

use std::io::ErrorKind;
use std::net::SocketAddr;

use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

#[derive(Debug)]
pub(crate) enum ConnectionState {
    AwaitLine1,
    AwaitLine2 { first: String },
    Dispatch(Request),
    Reply(Reply),
    Closed,
}

impl ConnectionState {
    pub(crate) fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

/// Serve one request/reply exchange on `stream`.
///
/// # Errors
///
/// - [`ServerError::Read`] if the peer's socket fails mid-read (no reply is sent)
/// - [`ServerError::Send`] if the reply cannot be written
pub(crate) async fn handle_connection<S>(
    stream: S,
    peer: SocketAddr,
    engine: AuthEngine,
) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut state = ConnectionState::AwaitLine1;

    while !state.is_closed() {
        state = match state {
            ConnectionState::AwaitLine1 => match read_request_line(&mut reader, peer).await? {
                Some(first) => ConnectionState::AwaitLine2 { first },
                None => ConnectionState::Reply(Reply::Malformed),
            },
            ConnectionState::AwaitLine2 { first } => {
                match read_request_line(&mut reader, peer).await? {
                    Some(second) => ConnectionState::Dispatch(Request::from_lines(first, second)),
                    None => ConnectionState::Reply(Reply::Malformed),
                }
            }
            ConnectionState::Dispatch(request) => {
                ConnectionState::Reply(dispatch(&engine, request, peer))
            }
            ConnectionState::Reply(reply) => {
                write_reply(&mut write_half, &reply, peer).await?;
                ConnectionState::Closed
            }
            ConnectionState::Closed => ConnectionState::Closed,
        };
    }

    Ok(())
}

/// `Ok(None)` for EOF and for lines the protocol refuses (oversize, non-UTF-8).
async fn read_request_line<R>(
    reader: &mut BufReader<R>,
    peer: SocketAddr,
) -> Result<Option<String>, ServerError>
where
    R: AsyncRead + Unpin,
{
    match protocol::read_line(reader).await {
        Ok(Some(line)) => Ok(Some(line)),
        Ok(None) => {
            warn!("Client {peer} closed the connection before sending a full request");
            Ok(None)
        }
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            warn!("Client {peer} sent a malformed line: {e}");
            Ok(None)
        }
        Err(e) => Err(ServerError::read(peer, &e)),
    }
}

pub(crate) fn dispatch(engine: &AuthEngine, request: Request, peer: SocketAddr) -> Reply {
    info!("Received {} request from {peer}", request.kind());

    match request {
        Request::TokenCheck { token } => {
            let valid = engine.is_token_valid(&token);
            info!("Token valid: {valid}");
            Reply::Valid(valid)
        }
        Request::TokenRevoke { token } => {
            engine.logout(&token);
            info!("Token revoked.");
            Reply::Revoked
        }
        Request::Login { username, password } => {
            Reply::Login(engine.authenticate(&username, password.expose()))
        }
    }
}

async fn write_reply<W>(writer: &mut W, reply: &Reply, peer: SocketAddr) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(reply.encode().as_bytes())
        .await
        .map_err(|e| ServerError::send(peer, &e))?;
    writer
        .flush()
        .await
        .map_err(|e| ServerError::send(peer, &e))?;

    if let Err(e) = writer.shutdown().await {
        debug!("Shutdown of write half to {peer} failed: {e}");
    }

    Ok(())
}
