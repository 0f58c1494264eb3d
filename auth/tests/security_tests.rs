//! Security-focused integration tests.
//!
//! This module contains tests that verify critical security properties
//! of the session core, including:
//!
//! - Single-winner refresh rotation under concurrency
//! - Token replay and forgery rejection
//! - Single use of password reset and verification links
//! - Account enumeration resistance

#![allow(clippy::unwrap_used)]

mod common;

use common::{PASSWORD, credentials, harness, harness_with};
use futures::future::join_all;
use marketplace_auth::AuthError;
use marketplace_auth::config::Secret;
use marketplace_auth::mocks::MockClock;
use marketplace_auth::state::{Role, StatelessKind};

/// Concurrent refreshes of one token must produce exactly one new family.
///
/// Rotation deletes the old refresh entry before issuing, and only the
/// delete that actually removed the entry may continue.
#[tokio::test]
async fn test_concurrent_refresh_has_single_winner() {
    let h = harness();
    let user = h.add_user("alice", Role::User, true);
    let issued = h.login(&user).await;
    let request = h.request(&issued);

    let results = join_all((0..10).map(|_| h.service.refresh(&request))).await;

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "Exactly one refresh should succeed");
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| *e == AuthError::Unauthenticated)
    );

    // Original family (3) plus one rotated family (3), minus the old refresh entry
    assert_eq!(h.store.session_count().unwrap(), 5);
}

#[tokio::test]
async fn test_concurrent_refresh_across_tasks() {
    let h = std::sync::Arc::new(harness());
    let user = h.add_user("alice", Role::User, true);
    let issued = h.login(&user).await;

    let mut handles = vec![];
    for _ in 0..8 {
        let h = h.clone();
        let issued = issued.clone();
        handles.push(tokio::spawn(async move {
            h.service.refresh(&h.request(&issued)).await.is_ok()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn test_tokens_signed_with_other_secrets_rejected() {
    let h = harness();
    let user = h.add_user("alice", Role::User, true);

    // Same cookie key, different signing secrets
    let mut forged_secrets = common::secrets();
    forged_secrets.access = Secret::new("attacker-access-secret-000000000000");
    forged_secrets.csrf = Secret::new("attacker-csrf-secret-00000000000000");
    forged_secrets.refresh = Secret::new("attacker-refresh-secret-00000000000");
    let forged_config = marketplace_auth::AuthConfig::new(forged_secrets).unwrap();
    let clock = MockClock::default();
    let forger = harness_with(&forged_config, &clock, &clock);
    forger.users.insert(user.clone()).unwrap();
    let forged = forger.login(&user).await;

    let request = h.request(&forged);
    assert!(request.cookie.is_some(), "Cookie key is shared, so it decodes");

    assert_eq!(
        h.service.validate_credentials(&request).await.unwrap_err(),
        AuthError::Unauthenticated
    );
    assert_eq!(
        h.service.refresh(&request).await.unwrap_err(),
        AuthError::Unauthenticated
    );
}

#[tokio::test]
async fn test_tampered_cookie_is_unauthenticated() {
    let h = harness();
    let user = h.add_user("alice", Role::User, true);
    let issued = h.login(&user).await;

    let mut tampered = issued.cookie_value.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let request = h
        .service
        .read_credentials(Some(&tampered), Some(&issued.csrf_token));

    assert_eq!(request.cookie, None);
    assert_eq!(
        h.service.validate_credentials(&request).await.unwrap_err(),
        AuthError::Unauthenticated
    );
}

#[tokio::test]
async fn test_csrf_token_cannot_stand_in_for_access_token() {
    let h = harness();
    let user = h.add_user("alice", Role::User, true);
    let issued = h.login(&user).await;

    let operator = h.service.operator();
    let result = operator
        .extract_token_metadata(&issued.csrf_token, &issued.csrf_token)
        .await;

    assert_eq!(result.unwrap_err(), AuthError::Unauthenticated);
}

#[tokio::test]
async fn test_password_reset_flow_is_single_use() {
    let h = harness();
    let user = h.add_user("alice", Role::User, true);
    let before = h.login(&user).await;

    h.service.request_password_reset(&user.email).await;

    let sent = h.email.sent().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, user.email);
    assert_eq!(sent[0].kind, StatelessKind::PasswordReset);
    assert!(sent[0].link.starts_with("https://market.test/reset-password?token="));
    let token = sent[0].token().unwrap().to_string();

    h.service
        .process_password_reset(&token, "a brand new password")
        .await
        .unwrap();

    assert_eq!(
        h.service
            .process_password_reset(&token, "yet another password")
            .await
            .unwrap_err(),
        AuthError::Unauthenticated
    );

    // Old password is gone, new one works
    assert_eq!(
        h.service
            .login(&credentials(&user.email, PASSWORD))
            .await
            .unwrap_err(),
        AuthError::InvalidCredentials
    );
    assert!(
        h.service
            .login(&credentials(&user.email, "a brand new password"))
            .await
            .is_ok()
    );

    // Sessions from before the reset were revoked
    assert_eq!(
        h.service
            .validate_credentials(&h.request(&before))
            .await
            .unwrap_err(),
        AuthError::Unauthenticated
    );
}

#[tokio::test]
async fn test_password_reset_without_sessions_succeeds() {
    let h = harness();
    let user = h.add_user("alice", Role::User, true);

    h.service.request_password_reset(&user.email).await;
    let token = h.email.sent().unwrap()[0].token().unwrap().to_string();

    assert!(h.service.process_password_reset(&token, "fresh").await.is_ok());
}

#[tokio::test]
async fn test_expired_reset_token_rejected() {
    let h = harness();
    let user = h.add_user("alice", Role::User, true);

    h.service.request_password_reset(&user.email).await;
    let token = h.email.sent().unwrap()[0].token().unwrap().to_string();

    h.clock.advance(chrono::Duration::minutes(16));

    assert_eq!(
        h.service
            .process_password_reset(&token, "too late")
            .await
            .unwrap_err(),
        AuthError::Unauthenticated
    );
}

#[tokio::test]
async fn test_password_reset_request_does_not_reveal_accounts() {
    let h = harness();
    h.add_user("unverified", Role::User, false);

    h.service.request_password_reset("nobody@market.test").await;
    h.service
        .request_password_reset("unverified@market.test")
        .await;

    assert!(h.email.sent().unwrap().is_empty());

    // Delivery failures are swallowed as well
    let user = h.add_user("alice", Role::User, true);
    h.email.set_fail(true);
    h.service.request_password_reset(&user.email).await;
}

#[tokio::test]
async fn test_account_verification_flow() {
    let h = harness();
    let user = h.add_user("newcomer", Role::User, false);

    h.service.request_account_verification(&user.email).await;
    let sent = h.email.sent().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, StatelessKind::AccountVerification);
    assert!(sent[0].link.starts_with("https://market.test/verify?token="));
    let token = sent[0].token().unwrap().to_string();

    h.service.validate_user(&token).await.unwrap();
    assert!(h.users.user(&user.id).unwrap().unwrap().verified);
    assert!(h.service.login(&credentials(&user.email, PASSWORD)).await.is_ok());

    assert_eq!(
        h.service.validate_user(&token).await.unwrap_err(),
        AuthError::Unauthenticated
    );

    // Already verified accounts get no further mail
    h.service.request_account_verification(&user.email).await;
    assert_eq!(h.email.sent().unwrap().len(), 1);
}

#[tokio::test]
async fn test_stateless_token_kinds_are_not_interchangeable() {
    let h = harness();
    let verified = h.add_user("alice", Role::User, true);
    let unverified = h.add_user("newcomer", Role::User, false);

    h.service.request_password_reset(&verified.email).await;
    h.service
        .request_account_verification(&unverified.email)
        .await;
    let sent = h.email.sent().unwrap();
    let reset_token = sent[0].token().unwrap().to_string();
    let verify_token = sent[1].token().unwrap().to_string();

    assert_eq!(
        h.service.validate_user(&reset_token).await.unwrap_err(),
        AuthError::Unauthenticated
    );
    assert_eq!(
        h.service
            .process_password_reset(&verify_token, "hijacked")
            .await
            .unwrap_err(),
        AuthError::Unauthenticated
    );
    assert!(!h.users.user(&unverified.id).unwrap().unwrap().verified);
}

#[tokio::test]
async fn test_session_tokens_are_not_stateless_tokens() {
    let h = harness();
    let user = h.add_user("alice", Role::User, true);
    let issued = h.login(&user).await;
    let cookie = h.request(&issued).cookie.unwrap();

    assert_eq!(
        h.service
            .process_password_reset(&cookie.access_token, "hijacked")
            .await
            .unwrap_err(),
        AuthError::Unauthenticated
    );
}
