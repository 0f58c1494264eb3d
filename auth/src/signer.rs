//! Signed claim sets.
//!
//! Every token class gets its own [`TokenSigner`], keyed with its own
//! secret. Tokens are HS256 JWTs. `exp` is mandatory and is compared
//! against the caller-supplied time rather than the wall clock, so the
//! whole check stays a pure function of `(token, secret, now)`.

use crate::claims::ExpiringClaims;
use crate::config::Secret;
use crate::error::{AuthError, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// HMAC signer and verifier for one token class.
#[derive(Clone)]
pub struct TokenSigner {
    class: &'static str,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    /// Create a signer for `class` using `secret`.
    #[must_use]
    pub fn new(class: &'static str, secret: &Secret) -> Self {
        // Only HS256 is accepted; `none` and every other algorithm fail
        // header validation.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            class,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign `claims`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InternalError`] if the claims cannot be encoded.
    pub fn sign<C: Serialize>(&self, claims: &C) -> Result<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(
            |e| {
                tracing::error!(class = self.class, error = %e, "Failed to sign token");
                AuthError::InternalError(format!("failed to sign {} token", self.class))
            },
        )
    }

    /// Verify `token` and return its claims.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] if the token is malformed,
    /// uses another algorithm, carries a bad signature or has expired at
    /// `now`.
    pub fn verify<C>(&self, token: &str, now: DateTime<Utc>) -> Result<C>
    where
        C: DeserializeOwned + ExpiringClaims,
    {
        let data = jsonwebtoken::decode::<C>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(class = self.class, error = %e, "Token rejected");
                AuthError::Unauthenticated
            })?;

        if data.claims.expires_at() <= now.timestamp() {
            tracing::debug!(
                class = self.class,
                exp = data.claims.expires_at(),
                now = now.timestamp(),
                "Token expired"
            );
            return Err(AuthError::Unauthenticated);
        }

        Ok(data.claims)
    }
}
