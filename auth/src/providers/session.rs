//! Session store trait.

use crate::error::Result;
use crate::state::{ConsumedTokenKey, SessionKey, SessionKeyPattern, UserId};
use chrono::Duration;

/// Revocation store.
///
/// Maps session family keys to their owner with a per-entry TTL. Presence
/// of an entry means "not revoked". Each operation is atomic per key;
/// there are no multi-key transactions.
///
/// # Implementation Notes
///
/// - Every call is a network round trip and must be bounded by a timeout
/// - A timeout or lost connection is `AuthError::StoreUnavailable`
/// - Scan cursors never outlive a single call
pub trait SessionStore: Send + Sync {
    /// Create or overwrite an entry.
    ///
    /// # Arguments
    ///
    /// - `key`: Family member key
    /// - `user_id`: Owner stored as the value
    /// - `ttl`: Time to live (at least one second is applied)
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The write is rejected → `AuthError::StoreWrite`
    /// - The store is unreachable → `AuthError::StoreUnavailable`
    fn put(
        &self,
        key: &SessionKey,
        user_id: &UserId,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Look up an entry.
    ///
    /// # Returns
    ///
    /// The owner, or `None` if the entry is absent or expired.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn get(
        &self,
        key: &SessionKey,
    ) -> impl std::future::Future<Output = Result<Option<UserId>>> + Send;

    /// Delete entries.
    ///
    /// Deleting an absent key is not an error.
    ///
    /// # Returns
    ///
    /// Number of entries that were actually removed.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn delete(
        &self,
        keys: &[SessionKey],
    ) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// List keys matching `pattern`.
    ///
    /// Not a snapshot: entries written while the scan runs may or may not
    /// be returned.
    ///
    /// # Errors
    ///
    /// Returns error if the store is unreachable.
    fn scan(
        &self,
        pattern: &SessionKeyPattern,
    ) -> impl std::future::Future<Output = Result<Vec<SessionKey>>> + Send;

    /// Atomically record a stateless token as used.
    ///
    /// # Returns
    ///
    /// `true` if this call recorded the marker, `false` if it already existed.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The write is rejected → `AuthError::StoreWrite`
    /// - The store is unreachable → `AuthError::StoreUnavailable`
    fn mark_consumed(
        &self,
        key: &ConsumedTokenKey,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}
