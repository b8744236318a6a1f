// Unit tests for the in-memory token store
// Covers issue/lookup/revoke and the collision retry path

use crate::error::TokenStoreError;
use crate::token_store::{MAX_ISSUE_ATTEMPTS, TokenStore};

use std::collections::HashSet;
use std::sync::Arc;

/// **VALUE**: Verifies an issued token is immediately valid and mapped to its user.
///
/// **WHY THIS MATTERS**: Login returns the token to the caller, who may validate it
/// on the very next request. It must be visible as soon as `issue` returns.
///
/// **BUG THIS CATCHES**: Would catch if the insert happened after returning, or if
/// the token was stored under a different key than the one returned.
#[test]
fn given_empty_store_when_issue_then_token_is_live_and_bound_to_user() {
    // GIVEN: Empty store
    let store = TokenStore::new();

    // WHEN: Issuing a token
    let token = store.issue("admin").expect("issue should succeed");

    // THEN: Token is live and bound to the user
    assert!(store.contains(&token));
    assert_eq!(store.username_for(&token).as_deref(), Some("admin"));
    assert_eq!(store.len(), 1);
}

/// **VALUE**: Verifies tokens are UUID-shaped (36 chars, 4 hyphens).
///
/// **BUG THIS CATCHES**: Would catch a switch to a weaker or shorter generator.
#[test]
fn given_store_when_issue_then_token_is_uuid_text() {
    let store = TokenStore::new();

    let token = store.issue("admin").expect("issue should succeed");

    assert_eq!(token.len(), 36);
    assert_eq!(token.matches('-').count(), 4);
}

/// **VALUE**: Verifies repeated logins by the same user each get their own token.
///
/// **WHY THIS MATTERS**: Sessions are independent; logging in twice must not
/// invalidate or reuse the first token.
#[test]
fn given_same_user_when_issue_twice_then_both_tokens_stay_valid() {
    let store = TokenStore::new();

    let first = store.issue("admin").expect("first issue");
    let second = store.issue("admin").expect("second issue");

    assert_ne!(first, second);
    assert!(store.contains(&first));
    assert!(store.contains(&second));
    assert_eq!(store.len(), 2);
}

/// **VALUE**: Verifies revoke removes exactly the given token.
///
/// **BUG THIS CATCHES**: Would catch revoke clearing all of a user's sessions, or
/// returning the wrong username.
#[test]
fn given_two_tokens_when_revoke_one_then_other_survives() {
    // GIVEN: Two live sessions
    let store = TokenStore::new();
    let doomed = store.issue("alice").expect("issue alice");
    let kept = store.issue("bob").expect("issue bob");

    // WHEN: Revoking one of them
    let revoked = store.revoke(&doomed);

    // THEN: Only that token is gone
    assert_eq!(revoked.as_deref(), Some("alice"));
    assert!(!store.contains(&doomed));
    assert!(store.contains(&kept));
}

/// **VALUE**: Verifies revoking an unknown token is a no-op.
///
/// **WHY THIS MATTERS**: Logout is idempotent. A double logout must not fail or
/// disturb other sessions.
#[test]
fn given_unknown_token_when_revoke_then_returns_none_and_store_unchanged() {
    let store = TokenStore::new();
    let live = store.issue("admin").expect("issue");

    assert_eq!(store.revoke("not-a-token"), None);
    assert_eq!(store.revoke(""), None);
    assert!(store.contains(&live));
    assert_eq!(store.len(), 1);
}

/// **VALUE**: Verifies a colliding candidate is retried instead of overwriting.
///
/// **WHY THIS MATTERS**: Overwriting would silently hand another user's live
/// session to the new caller.
///
/// **BUG THIS CATCHES**: Would catch an `insert` that replaces existing entries.
#[test]
fn given_collision_when_issue_then_retries_and_keeps_existing_session() {
    // GIVEN: A store where "fixed" already belongs to alice
    let store = TokenStore::new();
    store
        .issue_with("alice", || "fixed".to_string())
        .expect("seed issue");

    // WHEN: The generator collides once, then yields a fresh value
    let mut candidates = vec!["fresh".to_string(), "fixed".to_string()];
    let token = store
        .issue_with("bob", || candidates.pop().expect("generator exhausted"))
        .expect("retry should succeed");

    // THEN: Bob gets the fresh token and alice keeps hers
    assert_eq!(token, "fresh");
    assert_eq!(store.username_for("fixed").as_deref(), Some("alice"));
    assert_eq!(store.username_for("fresh").as_deref(), Some("bob"));
}

/// **VALUE**: Verifies issuing fails once every attempt collides.
///
/// **BUG THIS CATCHES**: Would catch an unbounded retry loop or a silent overwrite
/// after the last attempt.
#[test]
fn given_generator_always_collides_when_issue_then_returns_collision_error() {
    let store = TokenStore::new();
    store
        .issue_with("alice", || "fixed".to_string())
        .expect("seed issue");

    let mut calls = 0;
    let result = store.issue_with("bob", || {
        calls += 1;
        "fixed".to_string()
    });

    assert!(matches!(
        result,
        Err(TokenStoreError::Collision { attempts, .. }) if attempts == MAX_ISSUE_ATTEMPTS
    ));
    assert_eq!(calls, MAX_ISSUE_ATTEMPTS);
    assert_eq!(store.username_for("fixed").as_deref(), Some("alice"));
    assert_eq!(store.len(), 1);
}

/// **VALUE**: Verifies `clear` drops every session.
#[test]
fn given_live_sessions_when_clear_then_store_is_empty() {
    let store = TokenStore::new();
    let token = store.issue("admin").expect("issue");

    store.clear();

    assert!(store.is_empty());
    assert!(!store.contains(&token));
}

/// **VALUE**: Verifies concurrent issuing from many threads loses no sessions.
///
/// **WHY THIS MATTERS**: The protocol server handles each connection on its own
/// task; logins race on the same store.
///
/// **BUG THIS CATCHES**: Would catch lost inserts or duplicate tokens under contention.
#[test]
fn given_many_threads_when_issue_concurrently_then_all_tokens_distinct_and_live() {
    // GIVEN: One shared store
    let store = Arc::new(TokenStore::new());

    // WHEN: 8 threads issue 50 tokens each
    let handles: Vec<_> = (0..8)
        .map(|thread| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                (0..50)
                    .map(|_| store.issue(&format!("user-{thread}")).expect("issue"))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let tokens: Vec<String> = handles
        .into_iter()
        .flat_map(|handle| handle.join().expect("thread panicked"))
        .collect();

    // THEN: Every token is unique and live
    let unique: HashSet<&String> = tokens.iter().collect();
    assert_eq!(unique.len(), 400);
    assert_eq!(store.len(), 400);
    assert!(tokens.iter().all(|token| store.contains(token)));
}
