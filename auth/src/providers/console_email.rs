//! Console email provider for development.

use crate::error::Result;
use crate::providers::EmailProvider;
use chrono::{DateTime, Utc};
use tracing::info;

/// Console email provider.
///
/// Writes reset and verification links to the log instead of mailing
/// them. Never use it in production: the links are bearer credentials.
///
/// # Examples
///
/// ```ignore
/// use marketplace_auth::providers::ConsoleEmailProvider;
///
/// let provider = ConsoleEmailProvider::new();
/// provider.send_password_reset(
///     "user@example.com",
///     "http://localhost:3000/reset-password?token=abc",
///     Utc::now() + chrono::Duration::minutes(15),
/// ).await?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConsoleEmailProvider;

impl ConsoleEmailProvider {
    /// Create a new console email provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl EmailProvider for ConsoleEmailProvider {
    async fn send_password_reset(
        &self,
        to: &str,
        link: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        info!(
            to = %to,
            link = %link,
            expires_at = %expires_at,
            "Password reset email (development mode)"
        );
        Ok(())
    }

    async fn send_account_verification(
        &self,
        to: &str,
        link: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        info!(
            to = %to,
            link = %link,
            expires_at = %expires_at,
            "Account verification email (development mode)"
        );
        Ok(())
    }
}
