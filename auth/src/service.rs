//! Auth service.
//!
//! The operations other parts of the marketplace call: login, credential
//! validation, refresh, logout, and the password reset and account
//! verification flows. Everything here is transport-agnostic; the HTTP
//! layer only moves [`RequestCredentials`] in and [`IssuedCredentials`]
//! out.

use crate::clock::Clock;
use crate::config::{AuthConfig, CookieConfig, LinkConfig};
use crate::error::{AuthError, Result};
use crate::providers::{EmailProvider, PasswordHasher, SessionStore, UserRepository};
use crate::state::{Identity, LoginCredentials, Role, StatelessKind, User};
use crate::token::TokenOperator;
use crate::transport::{CookieCodec, IssuedCredentials, RequestCredentials};
use std::sync::Arc;

/// Session-facing operations of the marketplace.
pub struct AuthService<S, U, E> {
    operator: TokenOperator<S>,
    users: U,
    hasher: Arc<dyn PasswordHasher>,
    email: E,
    codec: CookieCodec,
    cookie: CookieConfig,
    links: LinkConfig,
    dummy_hash: String,
}

impl<S, U, E> AuthService<S, U, E>
where
    S: SessionStore,
    U: UserRepository,
    E: EmailProvider,
{
    /// Wire the service.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the cookie codec cannot be
    /// keyed, or the hasher's error if it cannot hash.
    pub fn new(
        config: &AuthConfig,
        store: S,
        users: U,
        hasher: Arc<dyn PasswordHasher>,
        email: E,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        // Unknown emails are checked against this so both 401 paths pay
        // for one hash verification.
        let dummy_hash = hasher.hash(&uuid::Uuid::new_v4().to_string())?;

        Ok(Self {
            operator: TokenOperator::new(store, config, clock),
            users,
            hasher,
            dummy_hash,
            email,
            codec: CookieCodec::new(&config.secrets.cookie, &config.cookie.name)?,
            cookie: config.cookie.clone(),
            links: config.links.clone(),
        })
    }

    /// Token operator.
    #[must_use]
    pub const fn operator(&self) -> &TokenOperator<S> {
        &self.operator
    }

    /// User repository.
    #[must_use]
    pub const fn users(&self) -> &U {
        &self.users
    }

    /// Cookie codec.
    #[must_use]
    pub const fn codec(&self) -> &CookieCodec {
        &self.codec
    }

    /// Session cookie attributes.
    #[must_use]
    pub const fn cookie_config(&self) -> &CookieConfig {
        &self.cookie
    }

    /// Decode raw cookie and header values.
    #[must_use]
    pub fn read_credentials(
        &self,
        cookie_value: Option<&str>,
        csrf_header: Option<&str>,
    ) -> RequestCredentials {
        RequestCredentials::from_transport(&self.codec, cookie_value, csrf_header)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Sessions
    // ═══════════════════════════════════════════════════════════════════

    /// Check email and password and open a new session.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] for an unknown email or wrong password
    /// - [`AuthError::AccountNotVerified`] if the account is not verified yet
    /// - Store errors while persisting the session
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<IssuedCredentials> {
        let Some(user) = self.users.find_by_email(&credentials.email).await? else {
            let _ = self.hasher.verify(&credentials.password, &self.dummy_hash);
            tracing::info!("Login for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.hasher.verify(&credentials.password, &user.password_hash) {
            tracing::info!(user_id = %user.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.verified {
            tracing::info!(user_id = %user.id, "Login for unverified account");
            return Err(AuthError::AccountNotVerified);
        }

        let details = self.operator.create_tokens(&user.id, user.role)?;
        self.operator.persist_tokens(&details).await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

        IssuedCredentials::issue(&self.codec, &details)
    }

    /// Resolve the caller of a request.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] for missing or invalid credentials
    /// - [`AuthError::StoreUnavailable`] if the store cannot be reached
    pub async fn validate_credentials(&self, request: &RequestCredentials) -> Result<Identity> {
        let (access_token, csrf_token) = request.access_pair()?;
        let details = self
            .operator
            .extract_token_metadata(access_token, csrf_token)
            .await?;
        Ok(details.identity())
    }

    /// Resolve the caller and require one of `roles`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Forbidden`] if the caller holds none of `roles`
    /// - Everything [`validate_credentials`](Self::validate_credentials) returns
    pub async fn require_role(
        &self,
        request: &RequestCredentials,
        roles: &[Role],
    ) -> Result<Identity> {
        let identity = self.validate_credentials(request).await?;
        if !identity.has_any_role(roles) {
            tracing::warn!(
                user_id = %identity.user_id,
                role = %identity.role,
                "Role not permitted"
            );
            return Err(AuthError::Forbidden);
        }
        Ok(identity)
    }

    /// Rotate the session carried by the request's cookie.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] if the refresh token is missing,
    ///   invalid, revoked or already rotated
    /// - Store errors from the rotation
    pub async fn refresh(&self, request: &RequestCredentials) -> Result<IssuedCredentials> {
        let refresh_token = request.refresh_token()?;
        let details = self.operator.refresh(refresh_token).await?;
        IssuedCredentials::issue(&self.codec, &details)
    }

    /// Revoke the caller's session.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] for invalid credentials or an
    ///   already partially revoked family
    /// - [`AuthError::StoreUnavailable`] if the store cannot be reached
    pub async fn logout(&self, request: &RequestCredentials) -> Result<()> {
        let (access_token, csrf_token) = request.access_pair()?;
        let details = self
            .operator
            .extract_token_metadata(access_token, csrf_token)
            .await?;

        self.operator
            .logout(&details.session_key, &details.csrf_key, &details.refresh_key())
            .await
    }

    /// Revoke every session of the caller.
    ///
    /// # Returns
    ///
    /// Number of store entries removed.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] for invalid credentials
    /// - [`AuthError::StoreUnavailable`] if the store cannot be reached
    pub async fn logout_all(&self, request: &RequestCredentials) -> Result<u64> {
        let (access_token, csrf_token) = request.access_pair()?;
        let details = self
            .operator
            .extract_token_metadata(access_token, csrf_token)
            .await?;

        self.operator.logout_all(&details.user_id).await
    }

    // ═══════════════════════════════════════════════════════════════════
    // Stateless token flows
    // ═══════════════════════════════════════════════════════════════════

    async fn send_link(&self, user: &User, kind: StatelessKind) -> Result<()> {
        let issued = self.operator.create_stateless_token(&user.id, kind)?;
        let link = self.links.link(kind, &issued.token);

        match kind {
            StatelessKind::PasswordReset => {
                self.email
                    .send_password_reset(&user.email, &link, issued.expires_at)
                    .await
            }
            StatelessKind::AccountVerification => {
                self.email
                    .send_account_verification(&user.email, &link, issued.expires_at)
                    .await
            }
        }
    }

    /// Mail a password reset link if `email` belongs to a verified account.
    ///
    /// Always succeeds from the caller's point of view; failures are only
    /// logged.
    pub async fn request_password_reset(&self, email: &str) {
        let user = match self.users.find_by_email(email).await {
            Ok(Some(user)) if user.verified => user,
            Ok(_) => {
                tracing::info!("Password reset requested for unknown or unverified account");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Password reset lookup failed");
                return;
            }
        };

        match self.send_link(&user, StatelessKind::PasswordReset).await {
            Ok(()) => tracing::info!(user_id = %user.id, "Password reset link sent"),
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Password reset link not sent");
            }
        }
    }

    /// Set a new password using a reset token.
    ///
    /// The token is consumed before the password changes, and every
    /// session of the user is revoked afterwards.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] if the token is invalid, expired or used
    /// - [`AuthError::UserNotFound`] if the user no longer exists
    /// - Repository, hashing and store errors
    pub async fn process_password_reset(&self, token: &str, new_password: &str) -> Result<()> {
        let claimed = self
            .operator
            .extract_stateless_token_metadata(token, StatelessKind::PasswordReset)?;
        if self.users.find_by_id(&claimed.user_id).await?.is_none() {
            tracing::warn!(user_id = %claimed.user_id, "Password reset for missing user");
            return Err(AuthError::UserNotFound);
        }

        let password_hash = self.hasher.hash(new_password)?;
        let details = self
            .operator
            .consume_stateless_token(token, StatelessKind::PasswordReset)
            .await?;
        self.users
            .update_password(&details.user_id, &password_hash)
            .await?;

        tracing::info!(user_id = %details.user_id, "Password reset");

        match self.operator.logout_all(&details.user_id).await {
            Ok(removed) => {
                tracing::info!(
                    user_id = %details.user_id,
                    removed,
                    "Revoked sessions after password reset"
                );
            }
            Err(AuthError::Unauthenticated) => {}
            Err(e) => {
                tracing::warn!(
                    user_id = %details.user_id,
                    error = %e,
                    "Failed to revoke sessions after password reset"
                );
            }
        }

        Ok(())
    }

    /// Mail an account verification link if `email` belongs to an
    /// unverified account.
    ///
    /// Always succeeds from the caller's point of view.
    pub async fn request_account_verification(&self, email: &str) {
        let user = match self.users.find_by_email(email).await {
            Ok(Some(user)) if !user.verified => user,
            Ok(_) => {
                tracing::info!("Verification requested for unknown or verified account");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Verification lookup failed");
                return;
            }
        };

        match self.send_link(&user, StatelessKind::AccountVerification).await {
            Ok(()) => tracing::info!(user_id = %user.id, "Verification link sent"),
            Err(e) => tracing::error!(user_id = %user.id, error = %e, "Verification link not sent"),
        }
    }

    /// Mark an account verified using a verification token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] if the token is invalid, expired or used
    /// - [`AuthError::UserNotFound`] if the user no longer exists
    /// - Repository and store errors
    pub async fn validate_user(&self, token: &str) -> Result<()> {
        let details = self
            .operator
            .consume_stateless_token(token, StatelessKind::AccountVerification)
            .await?;
        self.users.mark_verified(&details.user_id).await?;

        tracing::info!(user_id = %details.user_id, "Account verified");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{Secret, TokenSecrets};
    use crate::mocks::{
        InMemorySessionStore, MockClock, MockEmailProvider, MockPasswordHasher, MockUserRepository,
    };
    use crate::state::UserId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHasher {
        verifications: AtomicUsize,
    }

    impl PasswordHasher for CountingHasher {
        fn hash(&self, password: &str) -> Result<String> {
            MockPasswordHasher.hash(password)
        }

        fn verify(&self, password: &str, password_hash: &str) -> bool {
            self.verifications.fetch_add(1, Ordering::SeqCst);
            MockPasswordHasher.verify(password, password_hash)
        }
    }

    fn config() -> AuthConfig {
        AuthConfig::new(TokenSecrets {
            access: Secret::new("service-access-secret-000000000000000"),
            refresh: Secret::new("service-refresh-secret-00000000000000"),
            csrf: Secret::new("service-csrf-secret-0000000000000000"),
            password_reset: Secret::new("service-reset-secret-000000000000000"),
            account_verification: Secret::new("service-verify-secret-00000000000000"),
            cookie: Secret::new("service-cookie-secret-00000000000000"),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_email_still_verifies_a_password() {
        let clock = MockClock::default();
        let hasher = Arc::new(CountingHasher::default());
        let users = MockUserRepository::new();
        users
            .insert(User {
                id: UserId::new("alice"),
                email: "alice@example.com".into(),
                password_hash: MockPasswordHasher.hash("hunter2").unwrap(),
                role: Role::User,
                verified: true,
            })
            .unwrap();
        let service = AuthService::new(
            &config(),
            InMemorySessionStore::new(Arc::new(clock.clone())),
            users,
            hasher.clone(),
            MockEmailProvider::new(),
            Arc::new(clock),
        )
        .unwrap();

        let unknown = service
            .login(&LoginCredentials {
                email: "nobody@example.com".into(),
                password: "hunter2".into(),
            })
            .await;
        assert_eq!(unknown.unwrap_err(), AuthError::InvalidCredentials);
        assert_eq!(hasher.verifications.load(Ordering::SeqCst), 1);

        let wrong = service
            .login(&LoginCredentials {
                email: "alice@example.com".into(),
                password: "wrong".into(),
            })
            .await;
        assert_eq!(wrong.unwrap_err(), AuthError::InvalidCredentials);
        assert_eq!(hasher.verifications.load(Ordering::SeqCst), 2);
    }
}
