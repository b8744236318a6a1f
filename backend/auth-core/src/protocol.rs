//! Line protocol shared by the server and the client.
//!
//! One connection carries exactly one exchange: the client sends two
//! newline-terminated lines, the server answers with one or two lines and
//! closes.
//!
//! | first line     | second line | reply                          |
//! |----------------|-------------|--------------------------------|
//! | `TOKEN_CHECK`  | token       | `true` / `false`               |
//! | `TOKEN_REVOKE` | token       | `true`                         |
//! | anything else  | password    | `true` + token, or `false` + `false` |
//!
//! A connection that closes before both lines arrive gets a single `false`.

use common::RedactedSecret;

use std::io::{Error as IoError, ErrorKind};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

pub const TOKEN_CHECK: &str = "TOKEN_CHECK";
pub const TOKEN_REVOKE: &str = "TOKEN_REVOKE";

pub const REPLY_TRUE: &str = "true";
pub const REPLY_FALSE: &str = "false";

/// Upper bound for a single protocol line, terminator included.
pub const MAX_LINE_BYTES: u64 = 8 * 1024;

/// A decoded two-line request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Login {
        username: String,
        password: RedactedSecret,
    },
    TokenCheck {
        token: String,
    },
    TokenRevoke {
        token: String,
    },
}

impl Request {
    /// Interpret two received lines. The first line selects the command; any
    /// value that is not a reserved keyword is a username.
    pub fn from_lines(first: String, second: String) -> Self {
        match first.as_str() {
            TOKEN_CHECK => Request::TokenCheck { token: second },
            TOKEN_REVOKE => Request::TokenRevoke { token: second },
            _ => Request::Login {
                username: first,
                password: RedactedSecret::new(second),
            },
        }
    }

    /// Wire form: both lines, each terminated by `\n`.
    pub fn encode(&self) -> String {
        let (first, second) = match self {
            Request::Login { username, password } => (username.as_str(), password.expose()),
            Request::TokenCheck { token } => (TOKEN_CHECK, token.as_str()),
            Request::TokenRevoke { token } => (TOKEN_REVOKE, token.as_str()),
        };
        format!("{first}\n{second}\n")
    }

    /// False if any field would break the two-line framing.
    pub fn is_encodable(&self) -> bool {
        let fields: [&str; 2] = match self {
            Request::Login { username, password } => [username.as_str(), password.expose()],
            Request::TokenCheck { token } | Request::TokenRevoke { token } => [token.as_str(), ""],
        };
        fields.iter().all(|field| !field.contains(['\n', '\r']))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Request::Login { .. } => "login",
            Request::TokenCheck { .. } => "token_check",
            Request::TokenRevoke { .. } => "token_revoke",
        }
    }
}

/// A server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Valid(bool),
    Revoked,
    Login(Option<String>),
    Malformed,
}

impl Reply {
    pub fn encode(&self) -> String {
        match self {
            Reply::Valid(valid) => format!("{valid}\n"),
            Reply::Revoked => format!("{REPLY_TRUE}\n"),
            Reply::Login(Some(token)) => format!("{REPLY_TRUE}\n{token}\n"),
            Reply::Login(None) => format!("{REPLY_FALSE}\n{REPLY_FALSE}\n"),
            Reply::Malformed => format!("{REPLY_FALSE}\n"),
        }
    }
}

/// Lenient boolean: trimmed, case-insensitive `true`; everything else is false.
pub fn parse_bool(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(REPLY_TRUE)
}

/// Token from the second line of a login reply. Blank or `false` means none.
pub fn parse_login_token(line: Option<&str>) -> Option<String> {
    let token = line?.trim();
    if token.is_empty() || token.eq_ignore_ascii_case(REPLY_FALSE) {
        return None;
    }
    Some(token.to_string())
}

/// Read one line, without its `\n` / `\r\n` terminator.
///
/// Returns `Ok(None)` on EOF before any byte. A final line without a
/// terminator is returned as-is.
///
/// # Errors
///
/// [`ErrorKind::InvalidData`] if the line exceeds [`MAX_LINE_BYTES`] or is not
/// UTF-8; any other kind comes from the underlying reader.
pub async fn read_line<R>(reader: &mut R) -> Result<Option<String>, IoError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = (&mut *reader)
        .take(MAX_LINE_BYTES)
        .read_until(b'\n', &mut buf)
        .await?;

    if read == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if read as u64 >= MAX_LINE_BYTES {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("line exceeds {MAX_LINE_BYTES} bytes"),
        ));
    }

    String::from_utf8(buf)
        .map(Some)
        .map_err(|e| IoError::new(ErrorKind::InvalidData, e))
}
