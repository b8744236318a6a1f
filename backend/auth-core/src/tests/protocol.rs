// Unit tests for the line protocol codec
// Request classification, reply encoding, lenient parsing and bounded line reads

use crate::protocol::{
    MAX_LINE_BYTES, Reply, Request, TOKEN_CHECK, TOKEN_REVOKE, parse_bool, parse_login_token,
    read_line,
};

use std::io::ErrorKind;

// ============================================
// REQUEST CLASSIFICATION
// ============================================

/// **VALUE**: Verifies the two keywords select token commands.
#[test]
fn given_keyword_first_line_when_from_lines_then_token_command() {
    assert_eq!(
        Request::from_lines(TOKEN_CHECK.to_string(), "abc".to_string()),
        Request::TokenCheck {
            token: "abc".to_string()
        }
    );
    assert_eq!(
        Request::from_lines(TOKEN_REVOKE.to_string(), "abc".to_string()),
        Request::TokenRevoke {
            token: "abc".to_string()
        }
    );
}

/// **VALUE**: Verifies any other first line is treated as a username.
///
/// **WHY THIS MATTERS**: Keywords are matched exactly. A user literally named
/// `token_check` must still be able to log in.
///
/// **BUG THIS CATCHES**: Would catch case-insensitive or trimmed keyword matching.
#[test]
fn given_non_keyword_first_line_when_from_lines_then_login() {
    for first in ["admin", "token_check", " TOKEN_CHECK", ""] {
        let request = Request::from_lines(first.to_string(), "secret".to_string());
        match request {
            Request::Login { username, password } => {
                assert_eq!(username, first);
                assert_eq!(password.expose(), "secret");
            }
            other => panic!("Expected login for {first:?}, got {other:?}"),
        }
    }
}

/// **VALUE**: Verifies request encoding emits exactly two newline-terminated lines.
#[test]
fn given_requests_when_encode_then_two_lines() {
    let login = Request::from_lines("admin".to_string(), "password123".to_string());
    let check = Request::TokenCheck {
        token: "t-1".to_string(),
    };
    let revoke = Request::TokenRevoke {
        token: "t-1".to_string(),
    };

    assert_eq!(login.encode(), "admin\npassword123\n");
    assert_eq!(check.encode(), "TOKEN_CHECK\nt-1\n");
    assert_eq!(revoke.encode(), "TOKEN_REVOKE\nt-1\n");
}

/// **VALUE**: Verifies fields with line breaks are flagged as unsendable.
///
/// **BUG THIS CATCHES**: Would catch a client that lets `"x\nTOKEN_REVOKE"` smuggle
/// a different command onto the wire.
#[test]
fn given_field_with_line_break_when_is_encodable_then_false() {
    let injected = Request::from_lines("admin\nTOKEN_REVOKE".to_string(), "pw".to_string());
    let carriage = Request::TokenCheck {
        token: "abc\r".to_string(),
    };
    let password = Request::from_lines("admin".to_string(), "pw\n".to_string());
    let clean = Request::from_lines("admin".to_string(), "pw".to_string());

    assert!(!injected.is_encodable());
    assert!(!carriage.is_encodable());
    assert!(!password.is_encodable());
    assert!(clean.is_encodable());
}

/// **VALUE**: Verifies passwords never show up in debug output of a request.
#[test]
fn given_login_request_when_debug_formatted_then_password_redacted() {
    let request = Request::from_lines("admin".to_string(), "password123".to_string());

    let debug = format!("{request:?}");

    assert!(debug.contains("admin"));
    assert!(!debug.contains("password123"));
}

// ============================================
// REPLY ENCODING
// ============================================

/// **VALUE**: Verifies every reply shape on the wire.
///
/// **WHY THIS MATTERS**: Clients written against the service read these exact
/// strings. A rejected login must be two lines, a malformed request only one.
#[test]
fn given_replies_when_encode_then_exact_wire_text() {
    assert_eq!(Reply::Valid(true).encode(), "true\n");
    assert_eq!(Reply::Valid(false).encode(), "false\n");
    assert_eq!(Reply::Revoked.encode(), "true\n");
    assert_eq!(
        Reply::Login(Some("tok".to_string())).encode(),
        "true\ntok\n"
    );
    assert_eq!(Reply::Login(None).encode(), "false\nfalse\n");
    assert_eq!(Reply::Malformed.encode(), "false\n");
}

// ============================================
// LENIENT PARSING
// ============================================

#[test]
fn given_bool_lines_when_parse_bool_then_only_true_is_true() {
    assert!(parse_bool("true"));
    assert!(parse_bool("TRUE"));
    assert!(parse_bool("  True \r"));
    assert!(!parse_bool("false"));
    assert!(!parse_bool("yes"));
    assert!(!parse_bool(""));
}

/// **VALUE**: Verifies blank and `false` token lines mean "no token".
///
/// **BUG THIS CATCHES**: Would catch a client handing the literal string "false"
/// to the caller as a session token.
#[test]
fn given_token_lines_when_parse_login_token_then_blank_and_false_are_none() {
    assert_eq!(parse_login_token(None), None);
    assert_eq!(parse_login_token(Some("")), None);
    assert_eq!(parse_login_token(Some("   ")), None);
    assert_eq!(parse_login_token(Some("false")), None);
    assert_eq!(parse_login_token(Some("FALSE")), None);
    assert_eq!(
        parse_login_token(Some(" abc-123 ")).as_deref(),
        Some("abc-123")
    );
}

// ============================================
// BOUNDED LINE READS
// ============================================

#[tokio::test]
async fn given_lf_and_crlf_lines_when_read_line_then_terminators_stripped() {
    let mut reader: &[u8] = b"first\nsecond\r\nthird";

    assert_eq!(read_line(&mut reader).await.expect("read"), Some("first".to_string()));
    assert_eq!(read_line(&mut reader).await.expect("read"), Some("second".to_string()));
    assert_eq!(read_line(&mut reader).await.expect("read"), Some("third".to_string()));
    assert_eq!(read_line(&mut reader).await.expect("read"), None);
}

/// **VALUE**: Verifies an empty line is a value, not EOF.
///
/// **WHY THIS MATTERS**: Empty usernames and passwords are legal on the wire and
/// must be rejected by the credential check, not by the framing.
#[tokio::test]
async fn given_empty_line_when_read_line_then_some_empty_string() {
    let mut reader: &[u8] = b"\n";

    assert_eq!(read_line(&mut reader).await.expect("read"), Some(String::new()));
    assert_eq!(read_line(&mut reader).await.expect("read"), None);
}

/// **VALUE**: Verifies oversize lines are refused with `InvalidData`.
///
/// **BUG THIS CATCHES**: Would catch an unbounded read that lets a peer exhaust
/// memory by never sending a newline.
#[tokio::test]
async fn given_line_over_limit_when_read_line_then_invalid_data() {
    let oversized = vec![b'a'; MAX_LINE_BYTES as usize + 10];
    let mut reader: &[u8] = &oversized;

    let err = read_line(&mut reader).await.expect_err("oversize line must fail");

    assert_eq!(err.kind(), ErrorKind::InvalidData);
}

#[tokio::test]
async fn given_line_just_under_limit_when_read_line_then_accepted() {
    let mut line = vec![b'a'; MAX_LINE_BYTES as usize - 1];
    line.push(b'\n');
    let mut reader: &[u8] = &line;

    let read = read_line(&mut reader).await.expect("read");

    assert_eq!(read.map(|line| line.len()), Some(MAX_LINE_BYTES as usize - 1));
}

#[tokio::test]
async fn given_non_utf8_line_when_read_line_then_invalid_data() {
    let mut reader: &[u8] = b"\xff\xfe\n";

    let err = read_line(&mut reader).await.expect_err("non-utf8 must fail");

    assert_eq!(err.kind(), ErrorKind::InvalidData);
}
