//! Email provider trait.

use crate::error::Result;
use chrono::{DateTime, Utc};

/// Email provider.
///
/// This trait abstracts over email delivery services
/// (SMTP, SendGrid, AWS SES, etc.). Rendering is the provider's concern;
/// the session core only hands over the link.
pub trait EmailProvider: Send + Sync {
    /// Send password reset email.
    ///
    /// # Arguments
    ///
    /// - `to`: Recipient email address
    /// - `link`: Reset link including the token
    /// - `expires_at`: Token expiration timestamp
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailDeliveryFailed` if the provider rejects
    /// the request.
    fn send_password_reset(
        &self,
        to: &str,
        link: &str,
        expires_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Send account verification email.
    ///
    /// # Arguments
    ///
    /// - `to`: Recipient email address
    /// - `link`: Verification link including the token
    /// - `expires_at`: Token expiration timestamp
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailDeliveryFailed` if the provider rejects
    /// the request.
    fn send_account_verification(
        &self,
        to: &str,
        link: &str,
        expires_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
