//! Shared fixtures for the session integration tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use marketplace_auth::config::{LinkConfig, Secret, TokenSecrets};
use marketplace_auth::mocks::{
    InMemorySessionStore, MockClock, MockEmailProvider, MockPasswordHasher, MockUserRepository,
};
use marketplace_auth::providers::PasswordHasher;
use marketplace_auth::{
    AuthConfig, AuthService, IssuedCredentials, LoginCredentials, RequestCredentials, Role, User,
    UserId,
};
use std::sync::Arc;

pub const PASSWORD: &str = "correct horse battery staple";

pub type TestService = AuthService<InMemorySessionStore, MockUserRepository, MockEmailProvider>;

pub struct Harness {
    pub service: TestService,
    pub store: InMemorySessionStore,
    pub users: MockUserRepository,
    pub email: MockEmailProvider,
    pub clock: MockClock,
}

pub fn secrets() -> TokenSecrets {
    TokenSecrets {
        access: Secret::new("integration-access-secret-0000000000"),
        refresh: Secret::new("integration-refresh-secret-000000000"),
        csrf: Secret::new("integration-csrf-secret-000000000000"),
        password_reset: Secret::new("integration-reset-secret-00000000000"),
        account_verification: Secret::new("integration-verify-secret-0000000000"),
        cookie: Secret::new("integration-cookie-secret-0000000000"),
    }
}

pub fn config() -> AuthConfig {
    AuthConfig::new(secrets())
        .unwrap()
        .with_links(LinkConfig::from_base_url("https://market.test"))
}

/// Service whose store and tokens share one clock.
pub fn harness() -> Harness {
    let clock = MockClock::default();
    harness_with(&config(), &clock, &clock)
}

/// Service with separate token and store clocks.
///
/// Advancing only `token_clock` expires signatures while store entries
/// stay alive.
pub fn harness_with(
    config: &AuthConfig,
    token_clock: &MockClock,
    store_clock: &MockClock,
) -> Harness {
    let store = InMemorySessionStore::new(Arc::new(store_clock.clone()));
    let users = MockUserRepository::new();
    let email = MockEmailProvider::new();

    let service = AuthService::new(
        config,
        store.clone(),
        users.clone(),
        Arc::new(MockPasswordHasher),
        email.clone(),
        Arc::new(token_clock.clone()),
    )
    .unwrap();

    Harness {
        service,
        store,
        users,
        email,
        clock: token_clock.clone(),
    }
}

impl Harness {
    pub fn add_user(&self, id: &str, role: Role, verified: bool) -> User {
        let user = User {
            id: UserId::new(id),
            email: format!("{id}@market.test"),
            password_hash: MockPasswordHasher.hash(PASSWORD).unwrap(),
            role,
            verified,
        };
        self.users.insert(user.clone()).unwrap();
        user
    }

    pub async fn login(&self, user: &User) -> IssuedCredentials {
        self.service
            .login(&credentials(&user.email, PASSWORD))
            .await
            .unwrap()
    }

    pub fn request(&self, issued: &IssuedCredentials) -> RequestCredentials {
        self.service
            .read_credentials(Some(&issued.cookie_value), Some(&issued.csrf_token))
    }
}

pub fn credentials(email: &str, password: &str) -> LoginCredentials {
    LoginCredentials {
        email: email.to_string(),
        password: password.to_string(),
    }
}
