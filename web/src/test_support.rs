//! Service fixtures for unit tests.

#![allow(clippy::unwrap_used)]

use marketplace_auth::config::{Secret, TokenSecrets};
use marketplace_auth::mocks::{
    InMemorySessionStore, MockClock, MockEmailProvider, MockPasswordHasher, MockUserRepository,
};
use marketplace_auth::providers::PasswordHasher;
use marketplace_auth::{AuthConfig, AuthService, Role, User, UserId};
use std::sync::Arc;

pub const PASSWORD: &str = "hunter2hunter2";

pub type TestService = AuthService<InMemorySessionStore, MockUserRepository, MockEmailProvider>;

/// Service with one verified user `alice`; returns the user's email.
pub fn service() -> (TestService, String) {
    let config = AuthConfig::new(TokenSecrets {
        access: Secret::new("web-access-secret-00000000000000000"),
        refresh: Secret::new("web-refresh-secret-0000000000000000"),
        csrf: Secret::new("web-csrf-secret-000000000000000000"),
        password_reset: Secret::new("web-reset-secret-00000000000000000"),
        account_verification: Secret::new("web-verify-secret-0000000000000000"),
        cookie: Secret::new("web-cookie-secret-0000000000000000"),
    })
    .unwrap();

    let clock = MockClock::default();
    let users = MockUserRepository::new();
    let email = "alice@market.test".to_string();
    users
        .insert(User {
            id: UserId::new("alice"),
            email: email.clone(),
            password_hash: MockPasswordHasher.hash(PASSWORD).unwrap(),
            role: Role::User,
            verified: true,
        })
        .unwrap();

    let service = AuthService::new(
        &config,
        InMemorySessionStore::new(Arc::new(clock.clone())),
        users,
        Arc::new(MockPasswordHasher),
        MockEmailProvider::new(),
        Arc::new(clock),
    )
    .unwrap();

    (service, email)
}
