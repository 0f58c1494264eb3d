//! Mock email provider for testing.

use crate::error::{AuthError, Result};
use crate::providers::EmailProvider;
use crate::state::StatelessKind;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One recorded email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    /// Recipient.
    pub to: String,
    /// Which link was sent.
    pub kind: StatelessKind,
    /// Full link.
    pub link: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
}

impl SentEmail {
    /// Token carried in the link's `token` query parameter.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.link.split_once("?token=").map(|(_, token)| token)
    }
}

/// Mock email provider.
///
/// Records every email instead of sending it, and can simulate delivery
/// failure.
#[derive(Debug, Clone, Default)]
pub struct MockEmailProvider {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    fail: Arc<AtomicBool>,
}

impl MockEmailProvider {
    /// Create a new mock email provider that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send fail with `AuthError::EmailDeliveryFailed`.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Emails recorded so far.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn sent(&self) -> Result<Vec<SentEmail>> {
        Ok(self
            .sent
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .clone())
    }

    fn record(
        &self,
        kind: StatelessKind,
        to: &str,
        link: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AuthError::EmailDeliveryFailed);
        }
        self.sent
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .push(SentEmail {
                to: to.to_string(),
                kind,
                link: link.to_string(),
                expires_at,
            });
        Ok(())
    }
}

impl EmailProvider for MockEmailProvider {
    fn send_password_reset(
        &self,
        to: &str,
        link: &str,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send {
        let result = self.record(StatelessKind::PasswordReset, to, link, expires_at);
        async move { result }
    }

    fn send_account_verification(
        &self,
        to: &str,
        link: &str,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send {
        let result = self.record(StatelessKind::AccountVerification, to, link, expires_at);
        async move { result }
    }
}
