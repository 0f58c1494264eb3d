//! Transport adapters, framework-independent half.
//!
//! Access and refresh tokens travel together in one encrypted cookie; the
//! CSRF token travels in the `X-CSRF-Token` header. This module owns the
//! cookie codec and the request/response credential shapes. Writing the
//! actual `Set-Cookie` and header values is left to the HTTP layer.
//!
//! # Cookie format
//!
//! ```text
//! base64url( nonce[12] || AES-256-GCM(json{access_token, refresh_token}) )
//! ```
//!
//! The AES key is SHA-256 of the cookie secret. The cookie name is bound
//! as associated data, so a value cannot be replayed under another name.

use crate::config::Secret;
use crate::error::{AuthError, Result};
use crate::state::{Identity, TokenDetails};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const NONCE_LEN: usize = 12;

/// Cookie payload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookie")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .finish()
    }
}

/// Authenticated-encryption codec for [`SessionCookie`].
#[derive(Clone)]
pub struct CookieCodec {
    cipher: Aes256Gcm,
    cookie_name: String,
}

impl CookieCodec {
    /// Create a codec for the cookie called `cookie_name`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the cipher cannot be keyed.
    pub fn new(secret: &Secret, cookie_name: &str) -> Result<Self> {
        let key = Sha256::digest(secret.as_bytes());
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| AuthError::Configuration(format!("Invalid cookie key: {e}")))?;

        Ok(Self {
            cipher,
            cookie_name: cookie_name.to_string(),
        })
    }

    /// Cookie name this codec is bound to.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Encrypt `cookie` into a cookie value.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or encryption fails.
    pub fn encode(&self, cookie: &SessionCookie) -> Result<String> {
        let plaintext =
            serde_json::to_vec(cookie).map_err(|e| AuthError::Serialization(e.to_string()))?;

        // Fresh nonce per encryption
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: &plaintext,
                    aad: self.cookie_name.as_bytes(),
                },
            )
            .map_err(|e| AuthError::InternalError(format!("Cookie encryption failed: {e}")))?;

        let mut raw = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(raw))
    }

    /// Decrypt a cookie value.
    ///
    /// Any failure yields `None`: an undecodable cookie is the same as no
    /// cookie.
    #[must_use]
    pub fn decode(&self, value: &str) -> Option<SessionCookie> {
        let raw = URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|e| tracing::debug!(error = %e, "Session cookie is not base64"))
            .ok()?;

        if raw.len() <= NONCE_LEN {
            tracing::debug!(len = raw.len(), "Session cookie too short");
            return None;
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: self.cookie_name.as_bytes(),
                },
            )
            .map_err(|_| tracing::debug!("Session cookie failed authentication"))
            .ok()?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| tracing::debug!(error = %e, "Session cookie payload malformed"))
            .ok()
    }
}

/// Credentials read from an incoming request.
///
/// A missing or undecodable cookie and a missing header are both simply
/// absent; the operation that needs them reports `Unauthenticated`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCredentials {
    /// Decoded session cookie.
    pub cookie: Option<SessionCookie>,
    /// CSRF header value.
    pub csrf_token: Option<String>,
}

impl RequestCredentials {
    /// Read credentials from raw transport values.
    #[must_use]
    pub fn from_transport(
        codec: &CookieCodec,
        cookie_value: Option<&str>,
        csrf_header: Option<&str>,
    ) -> Self {
        Self {
            cookie: cookie_value.and_then(|value| codec.decode(value)),
            csrf_token: csrf_header
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(ToString::to_string),
        }
    }

    /// Access token and CSRF token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] if either is missing.
    pub fn access_pair(&self) -> Result<(&str, &str)> {
        match (&self.cookie, &self.csrf_token) {
            (Some(cookie), Some(csrf)) => Ok((cookie.access_token.as_str(), csrf.as_str())),
            _ => {
                tracing::debug!(
                    has_cookie = self.cookie.is_some(),
                    has_csrf = self.csrf_token.is_some(),
                    "Request credentials incomplete"
                );
                Err(AuthError::Unauthenticated)
            }
        }
    }

    /// Refresh token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] if there is no cookie.
    pub fn refresh_token(&self) -> Result<&str> {
        self.cookie
            .as_ref()
            .map(|cookie| cookie.refresh_token.as_str())
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Credentials to write onto a response after login or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredentials {
    /// Encrypted session cookie value.
    pub cookie_value: String,
    /// CSRF token for the response header.
    pub csrf_token: String,
    /// Identity the session was issued for.
    pub identity: Identity,
}

impl IssuedCredentials {
    /// Package a token family for transport.
    ///
    /// # Errors
    ///
    /// Returns error if the cookie cannot be encoded.
    pub fn issue(codec: &CookieCodec, details: &TokenDetails) -> Result<Self> {
        let cookie_value = codec.encode(&SessionCookie {
            access_token: details.access.token.clone(),
            refresh_token: details.refresh.token.clone(),
        })?;

        Ok(Self {
            cookie_value,
            csrf_token: details.csrf.token.clone(),
            identity: Identity {
                user_id: details.user_id.clone(),
                role: details.role,
            },
        })
    }
}
