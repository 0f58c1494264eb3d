//! In-memory session store for testing.

use crate::clock::Clock;
use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::{ConsumedTokenKey, SessionKey, SessionKeyPattern, UserId};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Entries {
    sessions: HashMap<SessionKey, (UserId, DateTime<Utc>)>,
    consumed: HashMap<ConsumedTokenKey, DateTime<Utc>>,
}

/// In-memory session store.
///
/// Honors TTLs against the injected clock, so advancing a
/// [`MockClock`](crate::mocks::MockClock) expires entries. Writes and the
/// whole store can be switched into failure modes.
#[derive(Clone)]
pub struct InMemorySessionStore {
    entries: Arc<Mutex<Entries>>,
    clock: Arc<dyn Clock>,
    fail_writes: Arc<AtomicBool>,
    unavailable: Arc<AtomicBool>,
}

impl InMemorySessionStore {
    /// Create a new store reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Entries::default())),
            clock,
            fail_writes: Arc::new(AtomicBool::new(false)),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make `put` and `mark_consumed` fail with `AuthError::StoreWrite`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every operation fail with `AuthError::StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of live session entries (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn session_count(&self) -> Result<usize> {
        let now = self.clock.now();
        Ok(self
            .lock()?
            .sessions
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count())
    }

    /// Expiry of a live entry (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn expiry_of(&self, key: &SessionKey) -> Result<Option<DateTime<Utc>>> {
        Ok(self.lock()?.sessions.get(key).map(|(_, expires_at)| *expires_at))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Entries>> {
        self.entries
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::StoreUnavailable("in-memory store offline".into()));
        }
        Ok(())
    }

    fn check_writable(&self) -> Result<()> {
        self.check_available()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AuthError::StoreWrite("in-memory store rejected write".into()));
        }
        Ok(())
    }

    fn ttl_or_min(ttl: Duration) -> Duration {
        ttl.max(Duration::seconds(1))
    }
}

impl SessionStore for InMemorySessionStore {
    fn put(
        &self,
        key: &SessionKey,
        user_id: &UserId,
        ttl: Duration,
    ) -> impl Future<Output = Result<()>> + Send {
        let result = self.check_writable().and_then(|()| {
            let expires_at = self.clock.now() + Self::ttl_or_min(ttl);
            self.lock()?
                .sessions
                .insert(key.clone(), (user_id.clone(), expires_at));
            Ok(())
        });

        async move { result }
    }

    fn get(&self, key: &SessionKey) -> impl Future<Output = Result<Option<UserId>>> + Send {
        let result = self.check_available().and_then(|()| {
            let now = self.clock.now();
            let mut entries = self.lock()?;
            let live = entries
                .sessions
                .get(key)
                .filter(|(_, expires_at)| *expires_at > now)
                .map(|(user_id, _)| user_id.clone());
            if live.is_none() {
                entries.sessions.remove(key);
            }
            Ok(live)
        });

        async move { result }
    }

    fn delete(&self, keys: &[SessionKey]) -> impl Future<Output = Result<u64>> + Send {
        let result = self.check_available().and_then(|()| {
            let now = self.clock.now();
            let mut entries = self.lock()?;
            let mut deleted = 0;
            for key in keys {
                if let Some((_, expires_at)) = entries.sessions.remove(key) {
                    if expires_at > now {
                        deleted += 1;
                    }
                }
            }
            Ok(deleted)
        });

        async move { result }
    }

    fn scan(
        &self,
        pattern: &SessionKeyPattern,
    ) -> impl Future<Output = Result<Vec<SessionKey>>> + Send {
        let result = self.check_available().and_then(|()| {
            let now = self.clock.now();
            Ok(self
                .lock()?
                .sessions
                .iter()
                .filter(|(key, (_, expires_at))| *expires_at > now && pattern.matches(key))
                .map(|(key, _)| key.clone())
                .collect())
        });

        async move { result }
    }

    fn mark_consumed(
        &self,
        key: &ConsumedTokenKey,
        ttl: Duration,
    ) -> impl Future<Output = Result<bool>> + Send {
        let result = self.check_writable().and_then(|()| {
            let now = self.clock.now();
            let mut entries = self.lock()?;
            if entries.consumed.get(key).is_some_and(|expires_at| *expires_at > now) {
                return Ok(false);
            }
            entries.consumed.insert(*key, now + Self::ttl_or_min(ttl));
            Ok(true)
        });

        async move { result }
    }
}
