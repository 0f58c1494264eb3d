//! Token operator.
//!
//! Issues correlated access/refresh/CSRF families, validates incoming
//! credentials against both the signature and the revocation store, rotates
//! refresh tokens, revokes families, and issues single-purpose stateless
//! tokens.
//!
//! # Session lifecycle
//!
//! ```text
//! Anonymous ──create+persist──▶ Authenticated ──refresh──▶ Authenticated'
//!                                     │                          │
//!                                     └──────logout/logout_all───┴──▶ Revoked
//! ```
//!
//! Every verification failure is reported as [`AuthError::Unauthenticated`].
//! The concrete cause only reaches the tracing log.

use crate::claims::{AccessClaims, CsrfClaims, RefreshClaims, StatelessClaims};
use crate::clock::Clock;
use crate::config::{AuthConfig, TokenLifetimes};
use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::signer::TokenSigner;
use crate::state::{
    AccessDetails, CorrelationBase, IssuedToken, RefreshDetails, Role, SessionKey,
    SessionKeyPattern, StatelessDetails, StatelessKind, TokenDetails, TokenKind, UserId,
};
use chrono::{DateTime, Duration, Utc};
use constant_time_eq::constant_time_eq;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// A freshly signed stateless token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatelessToken {
    /// Compact signed token.
    pub token: String,
    /// Value of the `exp` claim.
    pub expires_at: DateTime<Utc>,
}

fn same_user(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

fn timestamp(exp: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(exp, 0).ok_or(AuthError::Unauthenticated)
}

/// Orchestrates signing, verification and the revocation store.
pub struct TokenOperator<S> {
    store: S,
    access: TokenSigner,
    refresh: TokenSigner,
    csrf: TokenSigner,
    password_reset: TokenSigner,
    account_verification: TokenSigner,
    lifetimes: TokenLifetimes,
    clock: Arc<dyn Clock>,
}

impl<S: SessionStore> TokenOperator<S> {
    /// Create an operator over `store`.
    #[must_use]
    pub fn new(store: S, config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let secrets = &config.secrets;
        Self {
            store,
            access: TokenSigner::new("access", &secrets.access),
            refresh: TokenSigner::new("refresh", &secrets.refresh),
            csrf: TokenSigner::new("csrf", &secrets.csrf),
            password_reset: TokenSigner::new("password_reset", &secrets.password_reset),
            account_verification: TokenSigner::new(
                "account_verification",
                &secrets.account_verification,
            ),
            lifetimes: config.lifetimes,
            clock,
        }
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Configured lifetimes.
    #[must_use]
    pub const fn lifetimes(&self) -> &TokenLifetimes {
        &self.lifetimes
    }

    /// Current time according to the injected clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    const fn stateless_signer(&self, kind: StatelessKind) -> &TokenSigner {
        match kind {
            StatelessKind::PasswordReset => &self.password_reset,
            StatelessKind::AccountVerification => &self.account_verification,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Session families
    // ═══════════════════════════════════════════════════════════════════

    /// Sign a new access/refresh/CSRF family for `user_id`.
    ///
    /// Pure: nothing is written to the store. Call
    /// [`persist_tokens`](Self::persist_tokens) afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] if signing fails.
    pub fn create_tokens(&self, user_id: &UserId, role: Role) -> Result<TokenDetails> {
        let now = self.clock.now();
        let base = CorrelationBase::new();
        let sub = user_id.as_str().to_string();

        let access_exp = now + self.lifetimes.access;
        let refresh_exp = now + self.lifetimes.refresh;
        let csrf_exp = now + self.lifetimes.csrf;

        let access = self.access.sign(&AccessClaims {
            sid: base,
            sub: sub.clone(),
            role,
            exp: access_exp.timestamp(),
        })?;
        let refresh = self.refresh.sign(&RefreshClaims {
            rid: base,
            sub: sub.clone(),
            role,
            exp: refresh_exp.timestamp(),
        })?;
        let csrf = self.csrf.sign(&CsrfClaims {
            cid: base,
            sub,
            exp: csrf_exp.timestamp(),
        })?;

        let key = |kind| SessionKey::new(kind, base, user_id.clone());

        Ok(TokenDetails {
            base,
            user_id: user_id.clone(),
            role,
            access: IssuedToken {
                token: access,
                key: key(TokenKind::Access),
                expires_at: access_exp,
            },
            refresh: IssuedToken {
                token: refresh,
                key: key(TokenKind::Refresh),
                expires_at: refresh_exp,
            },
            csrf: IssuedToken {
                token: csrf,
                key: key(TokenKind::Csrf),
                expires_at: csrf_exp,
            },
        })
    }

    /// Write the three store entries of `details`.
    ///
    /// Each entry lives for the remaining lifetime of its token. If any
    /// write fails, the entries already written are removed again so no
    /// partial family survives.
    ///
    /// # Errors
    ///
    /// Returns the store error of the first failed write.
    pub async fn persist_tokens(&self, details: &TokenDetails) -> Result<()> {
        let now = self.clock.now();
        let mut written = Vec::with_capacity(3);

        for issued in details.tokens() {
            let ttl = issued.expires_at - now;
            if let Err(e) = self.store.put(&issued.key, &details.user_id, ttl).await {
                tracing::error!(
                    user_id = %details.user_id,
                    kind = issued.key.kind().as_str(),
                    error = %e,
                    "Failed to persist session family"
                );
                if let Err(cleanup) = self.store.delete(&written).await {
                    tracing::warn!(error = %cleanup, "Failed to remove partial session family");
                }
                return Err(e);
            }
            written.push(issued.key.clone());
        }

        Ok(())
    }

    async fn lookup(&self, key: &SessionKey) -> Result<UserId> {
        self.store.get(key).await?.ok_or_else(|| {
            tracing::debug!(
                kind = key.kind().as_str(),
                user_id = %key.user_id(),
                "Session entry missing (revoked or expired)"
            );
            AuthError::Unauthenticated
        })
    }

    /// Validate an access token together with its CSRF token.
    ///
    /// Both signatures and expiries are checked, both tokens must name the
    /// same user, and both store entries must still exist and point at
    /// that user.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] on any verification failure
    /// - [`AuthError::StoreUnavailable`] if the store cannot be reached
    pub async fn extract_token_metadata(
        &self,
        access_token: &str,
        csrf_token: &str,
    ) -> Result<AccessDetails> {
        let now = self.clock.now();
        let access: AccessClaims = self.access.verify(access_token, now)?;
        let csrf: CsrfClaims = self.csrf.verify(csrf_token, now)?;

        if !same_user(&access.sub, &csrf.sub) {
            tracing::warn!("CSRF token belongs to a different user than the access token");
            return Err(AuthError::Unauthenticated);
        }

        let user_id = UserId(access.sub);
        let session_key = SessionKey::new(TokenKind::Access, access.sid, user_id.clone());
        let csrf_key = SessionKey::new(TokenKind::Csrf, csrf.cid, user_id.clone());

        let session_owner = self.lookup(&session_key).await?;
        let csrf_owner = self.lookup(&csrf_key).await?;

        if !same_user(session_owner.as_str(), csrf_owner.as_str())
            || !same_user(session_owner.as_str(), user_id.as_str())
        {
            tracing::warn!(user_id = %user_id, "Session entries disagree on owner");
            return Err(AuthError::Unauthenticated);
        }

        Ok(AccessDetails {
            session_key,
            csrf_key,
            user_id,
            role: access.role,
        })
    }

    /// Verify a refresh token's signature and expiry.
    ///
    /// The store is not consulted; [`refresh`](Self::refresh) does that.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] if verification fails.
    pub fn extract_refresh_metadata(&self, refresh_token: &str) -> Result<RefreshDetails> {
        let claims: RefreshClaims = self.refresh.verify(refresh_token, self.clock.now())?;
        let user_id = UserId(claims.sub);

        Ok(RefreshDetails {
            refresh_key: SessionKey::new(TokenKind::Refresh, claims.rid, user_id.clone()),
            user_id,
            role: claims.role,
        })
    }

    /// Rotate a refresh token into a new, persisted family.
    ///
    /// The old refresh entry is deleted before the new family is issued.
    /// When two callers race with the same token, only the one whose
    /// delete removed the entry proceeds. The old access and CSRF entries
    /// are left to expire on their own.
    ///
    /// If persisting the new family fails the old one is already gone and
    /// the user has to log in again.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] if the token is invalid, revoked or
    ///   already rotated
    /// - Store errors from the delete or the new writes
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenDetails> {
        let details = self.extract_refresh_metadata(refresh_token)?;

        let owner = self.lookup(&details.refresh_key).await?;
        if !same_user(owner.as_str(), details.user_id.as_str()) {
            tracing::warn!(user_id = %details.user_id, "Refresh entry owned by another user");
            return Err(AuthError::Unauthenticated);
        }

        let removed = self
            .store
            .delete(std::slice::from_ref(&details.refresh_key))
            .await?;
        if removed == 0 {
            tracing::warn!(user_id = %details.user_id, "Refresh token already rotated");
            return Err(AuthError::Unauthenticated);
        }

        let tokens = self.create_tokens(&details.user_id, details.role)?;
        self.persist_tokens(&tokens).await?;

        tracing::info!(user_id = %details.user_id, "Rotated refresh token");

        Ok(tokens)
    }

    /// Revoke one session family.
    ///
    /// All three keys must share one correlation base; a CSRF token from
    /// another session of the same user is not enough to log out.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] if the keys belong to different
    ///   families or any of the three entries was already gone
    /// - [`AuthError::StoreUnavailable`] if the store cannot be reached
    pub async fn logout(
        &self,
        session_key: &SessionKey,
        csrf_key: &SessionKey,
        refresh_key: &SessionKey,
    ) -> Result<()> {
        let base = session_key.base();
        if csrf_key.base() != base || refresh_key.base() != base {
            tracing::warn!(
                user_id = %session_key.user_id(),
                "Logout with keys from different session families"
            );
            return Err(AuthError::Unauthenticated);
        }

        let keys = [session_key.clone(), csrf_key.clone(), refresh_key.clone()];
        let removed = self.store.delete(&keys).await?;

        if removed < 3 {
            tracing::warn!(
                user_id = %session_key.user_id(),
                removed,
                "Logout removed fewer entries than expected"
            );
            return Err(AuthError::Unauthenticated);
        }

        tracing::info!(user_id = %session_key.user_id(), "Logged out session");
        Ok(())
    }

    /// Revoke every session family of `user_id`.
    ///
    /// Entries written by a login that runs concurrently with the scan may
    /// survive.
    ///
    /// # Returns
    ///
    /// Number of entries removed.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] if nothing was removed
    /// - [`AuthError::StoreUnavailable`] if the store cannot be reached
    pub async fn logout_all(&self, user_id: &UserId) -> Result<u64> {
        let mut keys = HashSet::new();
        for kind in TokenKind::ALL {
            let found = self
                .store
                .scan(&SessionKeyPattern::new(kind, user_id.clone()))
                .await?;
            keys.extend(found);
        }

        let keys: Vec<SessionKey> = keys.into_iter().collect();
        let removed = self.store.delete(&keys).await?;

        if removed == 0 {
            tracing::warn!(user_id = %user_id, "Logout-all found no session entries");
            return Err(AuthError::Unauthenticated);
        }

        tracing::info!(user_id = %user_id, removed, "Logged out all sessions");
        Ok(removed)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Stateless tokens
    // ═══════════════════════════════════════════════════════════════════

    /// Sign a password reset or account verification token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] if signing fails.
    pub fn create_stateless_token(
        &self,
        user_id: &UserId,
        kind: StatelessKind,
    ) -> Result<StatelessToken> {
        let expires_at = self.clock.now() + self.lifetimes.stateless(kind);
        let token = self.stateless_signer(kind).sign(&StatelessClaims {
            sub: user_id.as_str().to_string(),
            purpose: kind,
            jti: Uuid::new_v4(),
            exp: expires_at.timestamp(),
        })?;

        Ok(StatelessToken { token, expires_at })
    }

    /// Verify a stateless token of the given kind.
    ///
    /// Does not check or record single use; see
    /// [`consume_stateless_token`](Self::consume_stateless_token).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] if verification fails.
    pub fn extract_stateless_token_metadata(
        &self,
        token: &str,
        kind: StatelessKind,
    ) -> Result<StatelessDetails> {
        let claims: StatelessClaims = self.stateless_signer(kind).verify(token, self.clock.now())?;

        if claims.purpose != kind {
            tracing::warn!(expected = kind.as_str(), "Stateless token purpose mismatch");
            return Err(AuthError::Unauthenticated);
        }

        Ok(StatelessDetails {
            user_id: UserId(claims.sub),
            kind,
            jti: claims.jti,
            expires_at: timestamp(claims.exp)?,
        })
    }

    /// Verify a stateless token and record it as used.
    ///
    /// The consumed marker lives until the token would have expired, so a
    /// second call with the same token fails for as long as the signature
    /// would still verify.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Unauthenticated`] if verification fails or the token
    ///   was already used
    /// - Store errors from recording the marker
    pub async fn consume_stateless_token(
        &self,
        token: &str,
        kind: StatelessKind,
    ) -> Result<StatelessDetails> {
        let details = self.extract_stateless_token_metadata(token, kind)?;
        let remaining: Duration = details.expires_at - self.clock.now();

        if !self
            .store
            .mark_consumed(&details.consumed_key(), remaining)
            .await?
        {
            tracing::warn!(
                user_id = %details.user_id,
                kind = kind.as_str(),
                "Stateless token reused"
            );
            return Err(AuthError::Unauthenticated);
        }

        Ok(details)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{Secret, TokenSecrets};
    use crate::mocks::{InMemorySessionStore, MockClock};

    fn config() -> AuthConfig {
        AuthConfig::new(TokenSecrets {
            access: Secret::new("access-secret-for-unit-tests-000000"),
            refresh: Secret::new("refresh-secret-for-unit-tests-00000"),
            csrf: Secret::new("csrf-secret-for-unit-tests-00000000"),
            password_reset: Secret::new("reset-secret-for-unit-tests-0000000"),
            account_verification: Secret::new("verify-secret-for-unit-tests-000000"),
            cookie: Secret::new("cookie-secret-for-unit-tests-000000"),
        })
        .unwrap()
    }

    fn operator() -> (TokenOperator<InMemorySessionStore>, MockClock) {
        let clock = MockClock::default();
        let store = InMemorySessionStore::new(Arc::new(clock.clone()));
        (TokenOperator::new(store, &config(), Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_family_shares_base_and_user() {
        let (operator, _clock) = operator();
        let user = UserId::new("42");

        let family = operator.create_tokens(&user, Role::User).unwrap();

        for issued in family.tokens() {
            assert_eq!(issued.key.base(), family.base);
            assert_eq!(issued.key.user_id(), &user);
        }
        assert_eq!(family.access.key.kind(), TokenKind::Access);
        assert_eq!(family.refresh.key.kind(), TokenKind::Refresh);
        assert_eq!(family.csrf.key.kind(), TokenKind::Csrf);
    }

    #[test]
    fn test_family_expiries() {
        let (operator, _clock) = operator();
        let now = operator.now();

        let family = operator.create_tokens(&UserId::new("42"), Role::User).unwrap();

        assert_eq!(family.access.expires_at - now, Duration::minutes(30));
        assert_eq!(family.csrf.expires_at - now, Duration::minutes(30));
        assert_eq!(family.refresh.expires_at - now, Duration::days(7));
    }

    #[test]
    fn test_create_tokens_writes_nothing() {
        let (operator, _clock) = operator();

        operator.create_tokens(&UserId::new("42"), Role::User).unwrap();

        assert_eq!(operator.store().session_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_persist_ttl_matches_token_expiry() {
        let (operator, _clock) = operator();
        let family = operator.create_tokens(&UserId::new("42"), Role::Admin).unwrap();

        operator.persist_tokens(&family).await.unwrap();

        for issued in family.tokens() {
            let stored = operator.store().expiry_of(&issued.key).unwrap().unwrap();
            assert_eq!(stored, issued.expires_at);
        }
    }

    #[test]
    fn test_tokens_not_interchangeable_across_classes() {
        let (operator, _clock) = operator();
        let family = operator.create_tokens(&UserId::new("42"), Role::User).unwrap();

        assert!(operator.extract_refresh_metadata(&family.access.token).is_err());
        assert!(operator.extract_refresh_metadata(&family.csrf.token).is_err());
        assert!(operator.extract_refresh_metadata(&family.refresh.token).is_ok());
    }

    #[test]
    fn test_stateless_kinds_do_not_cross() {
        let (operator, _clock) = operator();
        let user = UserId::new("42");

        let reset = operator
            .create_stateless_token(&user, StatelessKind::PasswordReset)
            .unwrap();

        assert!(operator
            .extract_stateless_token_metadata(&reset.token, StatelessKind::AccountVerification)
            .is_err());
        let details = operator
            .extract_stateless_token_metadata(&reset.token, StatelessKind::PasswordReset)
            .unwrap();
        assert_eq!(details.user_id, user);
        assert_eq!(details.expires_at.timestamp(), reset.expires_at.timestamp());
    }

    #[test]
    fn test_stateless_lifetimes() {
        let (operator, clock) = operator();
        let user = UserId::new("42");
        let reset = operator
            .create_stateless_token(&user, StatelessKind::PasswordReset)
            .unwrap();
        let verify = operator
            .create_stateless_token(&user, StatelessKind::AccountVerification)
            .unwrap();

        clock.advance(Duration::minutes(16));

        assert!(operator
            .extract_stateless_token_metadata(&reset.token, StatelessKind::PasswordReset)
            .is_err());
        assert!(operator
            .extract_stateless_token_metadata(&verify.token, StatelessKind::AccountVerification)
            .is_ok());
    }
}
