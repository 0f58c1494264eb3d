//! Error types for token and session operations.

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for the session core.
///
/// Verification failures of every kind collapse into
/// [`AuthError::Unauthenticated`]. The specific cause is only written to
/// the tracing log at the point of failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Credential Errors
    // ═══════════════════════════════════════════════════════════

    /// Credential is missing, forged, expired, revoked or mismatched.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Email/password pair did not match a user.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account exists but has not been verified yet.
    #[error("Account has not been verified")]
    AccountNotVerified,

    /// The referenced user no longer exists.
    #[error("User not found")]
    UserNotFound,

    /// Authenticated, but the role does not permit the operation.
    #[error("Forbidden")]
    Forbidden,

    // ═══════════════════════════════════════════════════════════
    // Session Store Errors
    // ═══════════════════════════════════════════════════════════

    /// The session store could not be reached or timed out.
    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    /// The session store rejected a write.
    #[error("Session store write failed: {0}")]
    StoreWrite(String),

    // ═══════════════════════════════════════════════════════════
    // Startup Errors
    // ═══════════════════════════════════════════════════════════

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// User repository operation failed.
    #[error("Repository error: {0}")]
    Repository(String),

    /// Email delivery failed.
    #[error("Failed to send email")]
    EmailDeliveryFailed,

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    /// Returns `true` if this error is caused by what the caller sent.
    ///
    /// # Examples
    ///
    /// ```
    /// # use marketplace_auth::AuthError;
    /// assert!(AuthError::Unauthenticated.is_user_error());
    /// assert!(!AuthError::StoreUnavailable("down".into()).is_user_error());
    /// ```
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated
                | Self::InvalidCredentials
                | Self::AccountNotVerified
                | Self::UserNotFound
                | Self::Forbidden
        )
    }

    /// Returns `true` if the whole request may be retried.
    ///
    /// # Examples
    ///
    /// ```
    /// # use marketplace_auth::AuthError;
    /// assert!(AuthError::StoreUnavailable("timeout".into()).is_retryable());
    /// assert!(!AuthError::Unauthenticated.is_retryable());
    /// ```
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_message_is_uniform() {
        assert_eq!(AuthError::Unauthenticated.to_string(), "Unauthenticated");
    }

    #[test]
    fn test_store_write_is_not_retryable() {
        assert!(!AuthError::StoreWrite("READONLY".into()).is_retryable());
        assert!(!AuthError::StoreWrite("READONLY".into()).is_user_error());
    }
}
