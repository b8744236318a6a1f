use crate::helpers::{DEMO_PASSWORD, DEMO_USERNAME, send_raw, start_test_server};

use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

// ============================================================================
// Wire-level tests for the protocol server
// Raw TCP lines in, raw lines out, exactly as an external client sees them
// ============================================================================

/// **VALUE**: Verifies a login over a real socket returns `true` and a token.
///
/// **WHY THIS MATTERS**: This is the only way tokens enter the system. If the
/// framing or reply is wrong here, nothing downstream can authenticate.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The server fails to bind or accept
/// - The reply is missing its second line
/// - The returned token is not actually stored
#[tokio::test]
async fn given_running_server_when_valid_login_then_receives_true_and_token() {
    // GIVEN: Server on an ephemeral port
    let (mut server, addr) = start_test_server().await;

    // WHEN: Client sends the demo credentials
    let reply = send_raw(addr, &format!("{DEMO_USERNAME}\n{DEMO_PASSWORD}\n"), false).await;

    // THEN: `true` followed by a token that the engine knows
    let mut lines = reply.lines();
    assert_eq!(lines.next(), Some("true"));
    let token = lines.next().expect("reply should carry a token");
    assert!(server.engine().is_token_valid(token));
    assert_eq!(lines.next(), None);

    server.stop().await;
}

/// **VALUE**: Verifies a rejected login gets exactly `false\nfalse\n`.
#[tokio::test]
async fn given_running_server_when_wrong_password_then_receives_false_false() {
    let (mut server, addr) = start_test_server().await;

    let reply = send_raw(addr, "admin\nwrong\n", false).await;

    assert_eq!(reply, "false\nfalse\n");
    assert!(server.engine().store().is_empty());
    server.stop().await;
}

/// **VALUE**: Verifies empty username and password are answered, not dropped.
#[tokio::test]
async fn given_running_server_when_empty_credentials_then_receives_false_false() {
    let (mut server, addr) = start_test_server().await;

    let reply = send_raw(addr, "\n\n", false).await;

    assert_eq!(reply, "false\nfalse\n");
    server.stop().await;
}

/// **VALUE**: Verifies the full token lifecycle over the wire: login, check,
/// revoke, check again.
///
/// **BUG THIS CATCHES**: Would catch TOKEN_REVOKE not removing the token, or
/// TOKEN_CHECK consulting a different store than login writes to.
#[tokio::test]
async fn given_issued_token_when_check_revoke_check_then_true_true_false() {
    // GIVEN: A token obtained over the wire
    let (mut server, addr) = start_test_server().await;
    let login = send_raw(addr, "admin\npassword123\n", false).await;
    let token = login.lines().nth(1).expect("token line").to_string();

    // WHEN: Checking, revoking, checking again
    let first_check = send_raw(addr, &format!("TOKEN_CHECK\n{token}\n"), false).await;
    let revoke = send_raw(addr, &format!("TOKEN_REVOKE\n{token}\n"), false).await;
    let second_check = send_raw(addr, &format!("TOKEN_CHECK\n{token}\n"), false).await;

    // THEN: Valid, revoked, invalid
    assert_eq!(first_check, "true\n");
    assert_eq!(revoke, "true\n");
    assert_eq!(second_check, "false\n");

    server.stop().await;
}

/// **VALUE**: Verifies an unknown token checks as `false` and revokes as `true`.
#[tokio::test]
async fn given_unknown_token_when_check_and_revoke_then_false_and_true() {
    let (mut server, addr) = start_test_server().await;

    assert_eq!(send_raw(addr, "TOKEN_CHECK\nnope\n", false).await, "false\n");
    assert_eq!(send_raw(addr, "TOKEN_REVOKE\nnope\n", false).await, "true\n");

    server.stop().await;
}

/// **VALUE**: Verifies a client that closes after one line gets a single `false`.
///
/// **WHY THIS MATTERS**: Half-finished requests must be answered and closed so
/// the connection task ends instead of leaking.
#[tokio::test]
async fn given_half_request_when_client_closes_then_receives_single_false() {
    let (mut server, addr) = start_test_server().await;

    let reply = send_raw(addr, "admin\n", true).await;

    assert_eq!(reply, "false\n");
    server.stop().await;
}

/// **VALUE**: Verifies a client stalled between its two lines does not hold up
/// anyone else.
///
/// **BUG THIS CATCHES**: Would catch a server that reads each connection to
/// completion before accepting the next one.
#[tokio::test]
async fn given_stalled_client_when_second_client_logs_in_then_login_completes() {
    // GIVEN: One connection that sent only its username and then went quiet
    let (mut server, addr) = start_test_server().await;
    let mut stalled = TcpStream::connect(addr)
        .await
        .expect("Failed to connect to auth server");
    stalled
        .write_all(format!("{DEMO_USERNAME}\n").as_bytes())
        .await
        .expect("Failed to send username");

    // WHEN: A second client performs a full login
    let reply = tokio::time::timeout(
        Duration::from_secs(2),
        send_raw(addr, &format!("{DEMO_USERNAME}\n{DEMO_PASSWORD}\n"), false),
    )
    .await
    .expect("login blocked behind the stalled connection");

    // THEN: It succeeds while the first connection is still open
    assert_eq!(reply.lines().next(), Some("true"), "reply was {reply:?}");

    drop(stalled);
    server.stop().await;
}

/// **VALUE**: Verifies concurrent logins each get their own token.
///
/// **BUG THIS CATCHES**: Would catch a serial server that blocks one client on
/// another, or tokens shared between connections.
#[tokio::test]
async fn given_concurrent_clients_when_login_then_all_receive_distinct_tokens() {
    let (mut server, addr) = start_test_server().await;

    let tasks: Vec<_> = (0..20)
        .map(|_| tokio::spawn(send_raw(addr, "admin\npassword123\n", false)))
        .collect();

    let mut tokens = Vec::new();
    for task in tasks {
        let reply = task.await.expect("client task panicked");
        let token = reply.lines().nth(1).expect("token line").to_string();
        tokens.push(token);
    }

    tokens.sort();
    tokens.dedup();
    assert_eq!(tokens.len(), 20);
    assert_eq!(server.engine().store().len(), 20);

    server.stop().await;
}
