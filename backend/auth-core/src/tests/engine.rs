// Unit tests for AuthEngine
// Login, validation, logout and credential backend failures

use crate::credentials::{CredentialCheck, DemoCredentials};
use crate::engine::AuthEngine;
use crate::error::CredentialError;
use crate::token_store::TokenStore;

use std::sync::Arc;

fn demo_engine() -> AuthEngine {
    AuthEngine::new(
        Arc::new(DemoCredentials::new("admin", "password123")),
        Arc::new(TokenStore::new()),
    )
}

/// **VALUE**: Verifies the happy path: correct credentials yield a live token.
///
/// **BUG THIS CATCHES**: Would catch a token being returned but never stored.
#[test]
fn given_valid_credentials_when_authenticate_then_returns_live_token() {
    // GIVEN: Engine with demo credentials
    let engine = demo_engine();

    // WHEN: Logging in with the right pair
    let token = engine.authenticate("admin", "password123");

    // THEN: Token is returned and valid
    let token = token.expect("login should succeed");
    assert!(engine.is_token_valid(&token));
    assert_eq!(engine.username_for_token(&token).as_deref(), Some("admin"));
}

/// **VALUE**: Verifies a rejected login leaves the store untouched.
///
/// **WHY THIS MATTERS**: Failed logins must not create half-sessions that an
/// attacker could later guess.
#[test]
fn given_invalid_credentials_when_authenticate_then_none_and_store_unchanged() {
    let engine = demo_engine();

    assert_eq!(engine.authenticate("admin", "wrong"), None);
    assert_eq!(engine.authenticate("root", "password123"), None);
    assert_eq!(engine.authenticate("", ""), None);
    assert!(engine.store().is_empty());
}

/// **VALUE**: Verifies credential comparison is exact (case and whitespace).
///
/// **BUG THIS CATCHES**: Would catch trimming or case folding of usernames/passwords.
#[test]
fn given_near_miss_credentials_when_authenticate_then_rejected() {
    let engine = demo_engine();

    assert_eq!(engine.authenticate("Admin", "password123"), None);
    assert_eq!(engine.authenticate("admin ", "password123"), None);
    assert_eq!(engine.authenticate("admin", "password123 "), None);
}

/// **VALUE**: Verifies a failing credential backend is treated as a rejected login.
///
/// **WHY THIS MATTERS**: A backend outage must never grant access.
#[test]
fn given_backend_error_when_authenticate_then_none_and_store_unchanged() {
    // GIVEN: A credential check that always fails
    let failing: Arc<dyn CredentialCheck> =
        Arc::new(|_: &str, _: &str| -> Result<bool, CredentialError> {
            Err(CredentialError::backend("directory offline"))
        });
    let engine = AuthEngine::new(failing, Arc::new(TokenStore::new()));

    // WHEN/THEN: Login is refused and nothing is stored
    assert_eq!(engine.authenticate("admin", "password123"), None);
    assert!(engine.store().is_empty());
}

/// **VALUE**: Verifies a panicking credential check is reported as a failed login.
///
/// **BUG THIS CATCHES**: Would catch the panic unwinding out of `authenticate`
/// and leaving the caller with no answer at all.
#[test]
fn given_panicking_check_when_authenticate_then_none_and_store_unchanged() {
    let engine = AuthEngine::new(
        Arc::new(|_: &str, _: &str| -> Result<bool, CredentialError> {
            panic!("directory client bug")
        }),
        Arc::new(TokenStore::new()),
    );

    let token = engine.authenticate("admin", "password123");

    assert!(token.is_none());
    assert!(engine.store().is_empty());
}

/// **VALUE**: Verifies any closure can serve as a credential check.
#[test]
fn given_closure_credentials_when_authenticate_then_closure_decides() {
    let check: Arc<dyn CredentialCheck> =
        Arc::new(|user: &str, pass: &str| -> Result<bool, CredentialError> { Ok(user == pass) });
    let engine = AuthEngine::new(check, Arc::new(TokenStore::new()));

    assert!(engine.authenticate("same", "same").is_some());
    assert!(engine.authenticate("one", "other").is_none());
}

/// **VALUE**: Verifies logout invalidates the token and is idempotent.
///
/// **BUG THIS CATCHES**: Would catch logout panicking on the second call.
#[test]
fn given_live_token_when_logout_twice_then_token_invalid_and_no_panic() {
    let engine = demo_engine();
    let token = engine
        .authenticate("admin", "password123")
        .expect("login should succeed");

    engine.logout(&token);
    engine.logout(&token);

    assert!(!engine.is_token_valid(&token));
    assert!(engine.store().is_empty());
}

/// **VALUE**: Verifies clones share the same sessions.
///
/// **WHY THIS MATTERS**: Every connection task holds its own clone of the engine.
#[test]
fn given_cloned_engine_when_login_on_one_then_other_sees_token() {
    let engine = demo_engine();
    let clone = engine.clone();

    let token = engine
        .authenticate("admin", "password123")
        .expect("login should succeed");

    assert!(clone.is_token_valid(&token));
    clone.logout(&token);
    assert!(!engine.is_token_valid(&token));
}

/// **VALUE**: Verifies concurrent logins each receive a distinct valid token.
#[test]
fn given_concurrent_logins_when_authenticate_then_tokens_distinct() {
    let engine = demo_engine();

    let tokens: Vec<String> = (0..16)
        .map(|_| {
            let engine = engine.clone();
            std::thread::spawn(move || engine.authenticate("admin", "password123"))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| {
            handle
                .join()
                .expect("thread panicked")
                .expect("login should succeed")
        })
        .collect();

    let mut sorted = tokens.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), 16);
    assert!(tokens.iter().all(|token| engine.is_token_valid(token)));
}

/// **VALUE**: Verifies concurrent logins for different users each map the token
/// back to the user who logged in.
///
/// **BUG THIS CATCHES**: Would catch a shared buffer or a racy insert pairing one
/// user's token with another user's name.
#[test]
fn given_concurrent_logins_for_distinct_users_when_authenticate_then_each_token_maps_to_its_user()
{
    // GIVEN: Engine accepting any `user-N` with password `pw`
    let engine = AuthEngine::new(
        Arc::new(|user: &str, pass: &str| -> Result<bool, CredentialError> {
            Ok(user.starts_with("user-") && pass == "pw")
        }),
        Arc::new(TokenStore::new()),
    );

    // WHEN: 16 threads log in as 16 different users at once
    let logins: Vec<(String, String)> = (0..16)
        .map(|n| {
            let engine = engine.clone();
            std::thread::spawn(move || {
                let username = format!("user-{n}");
                let token = engine
                    .authenticate(&username, "pw")
                    .expect("login should succeed");
                (username, token)
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().expect("thread panicked"))
        .collect();

    // THEN: Every token resolves to the user that received it
    assert_eq!(engine.store().len(), 16);
    for (username, token) in &logins {
        assert_eq!(
            engine.username_for_token(token).as_deref(),
            Some(username.as_str())
        );
    }
}
