//! Redis-based session store implementation.
//!
//! # Architecture
//!
//! Each member of a session family is one plain string entry:
//! - **Key**: `auth:session:{kind}:{base64url(user_id)}:{base}`
//! - **Value**: the owning user id
//! - **TTL**: remaining lifetime of the token at creation time
//!
//! Consumed stateless tokens are recorded as `auth:consumed:{kind}:{jti}`
//! markers written with `SET NX EX`.
//!
//! Every command runs under the configured timeout. An elapsed timeout or
//! a dropped connection surfaces as `AuthError::StoreUnavailable`.
//!
//! # Example
//!
//! ```no_run
//! use marketplace_auth::config::StoreConfig;
//! use marketplace_auth::stores::RedisSessionStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = RedisSessionStore::new(&StoreConfig::new("redis://127.0.0.1:6379")).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::StoreConfig;
use crate::error::{AuthError, Result};
use crate::providers::SessionStore;
use crate::state::{ConsumedTokenKey, SessionKey, SessionKeyPattern, UserId};
use chrono::Duration;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use std::future::Future;

/// Whether a failed command was a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Read,
    Write,
}

/// Redis-based session store with TTL-based expiration.
///
/// Provides:
/// - Per-entry TTL derived from the token `exp`
/// - Multi-key `DEL` returning the removed count
/// - Cursor-based `SCAN` kept local to each call
/// - Connection pooling via `ConnectionManager`
#[derive(Clone)]
pub struct RedisSessionStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
    command_timeout: std::time::Duration,
    scan_count: usize,
}

impl RedisSessionStore {
    /// Create a new Redis session store.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The URL is invalid → `AuthError::Configuration`
    /// - Redis cannot be reached in time → `AuthError::StoreUnavailable`
    pub async fn new(config: &StoreConfig) -> Result<Self> {
        let client = Client::open(config.redis_url.as_str()).map_err(|e| {
            AuthError::Configuration(format!("Invalid Redis URL: {e}"))
        })?;

        let connect = ConnectionManager::new(client);
        let conn_manager = tokio::time::timeout(config.command_timeout, connect)
            .await
            .map_err(|_| AuthError::StoreUnavailable("Timed out connecting to Redis".into()))?
            .map_err(|e| {
                AuthError::StoreUnavailable(format!(
                    "Failed to create Redis connection manager: {e}"
                ))
            })?;

        Ok(Self {
            conn_manager,
            command_timeout: config.command_timeout,
            scan_count: config.scan_count,
        })
    }

    fn ttl_seconds(ttl: Duration) -> u64 {
        u64::try_from(ttl.num_seconds()).unwrap_or(0).max(1)
    }

    /// Like [`Self::ttl_seconds`] but rounded up, so the entry never
    /// expires before the token it guards.
    fn ttl_seconds_ceil(ttl: Duration) -> u64 {
        let millis = u64::try_from(ttl.num_milliseconds()).unwrap_or(0);
        millis.div_ceil(1000).max(1)
    }

    async fn bounded<T, F>(&self, op: &'static str, command: Command, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.command_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::error!(op, error = %e, "Session store command failed");
                Err(Self::classify(op, command, &e))
            }
            Err(_) => {
                let timeout_ms =
                    u64::try_from(self.command_timeout.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(op, timeout_ms, "Session store command timed out");
                Err(AuthError::StoreUnavailable(format!("{op} timed out")))
            }
        }
    }

    fn classify(op: &str, command: Command, e: &RedisError) -> AuthError {
        let transport = e.is_io_error()
            || e.is_connection_dropped()
            || e.is_connection_refusal()
            || e.is_timeout();

        if command == Command::Write && !transport {
            AuthError::StoreWrite(format!("{op}: {e}"))
        } else {
            AuthError::StoreUnavailable(format!("{op}: {e}"))
        }
    }
}

impl SessionStore for RedisSessionStore {
    async fn put(&self, key: &SessionKey, user_id: &UserId, ttl: Duration) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let ttl_seconds = Self::ttl_seconds(ttl);

        let _: () = self
            .bounded(
                "SET",
                Command::Write,
                conn.set_ex(key.to_string(), user_id.as_str(), ttl_seconds),
            )
            .await?;

        tracing::debug!(
            kind = key.kind().as_str(),
            user_id = %user_id,
            ttl_seconds,
            "Stored session entry"
        );

        Ok(())
    }

    async fn get(&self, key: &SessionKey) -> Result<Option<UserId>> {
        let mut conn = self.conn_manager.clone();

        let value: Option<String> = self
            .bounded("GET", Command::Read, conn.get(key.to_string()))
            .await?;

        Ok(value.map(UserId))
    }

    async fn delete(&self, keys: &[SessionKey]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn_manager.clone();
        let raw: Vec<String> = keys.iter().map(ToString::to_string).collect();

        let deleted: u64 = self
            .bounded("DEL", Command::Write, conn.del(raw))
            .await?;

        tracing::debug!(requested = keys.len(), deleted, "Deleted session entries");

        Ok(deleted)
    }

    async fn scan(&self, pattern: &SessionKeyPattern) -> Result<Vec<SessionKey>> {
        let mut conn = self.conn_manager.clone();
        let pattern = pattern.to_string();
        let count = self.scan_count;

        // The cursor lives inside this call only.
        let raw: Vec<String> = self
            .bounded("SCAN", Command::Read, async {
                let mut cursor: u64 = 0;
                let mut keys = Vec::new();
                loop {
                    let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(count)
                        .query_async(&mut conn)
                        .await?;
                    keys.extend(batch);
                    if next == 0 {
                        break;
                    }
                    cursor = next;
                }
                Ok::<_, RedisError>(keys)
            })
            .await?;

        let keys: Vec<SessionKey> = raw
            .iter()
            .filter_map(|k| {
                let parsed = SessionKey::parse(k);
                if parsed.is_none() {
                    tracing::warn!(key = %k, "Skipping unparseable session key");
                }
                parsed
            })
            .collect();

        tracing::debug!(pattern = %pattern, matched = keys.len(), "Scanned session entries");

        Ok(keys)
    }

    async fn mark_consumed(&self, key: &ConsumedTokenKey, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn_manager.clone();
        let ttl_seconds = Self::ttl_seconds_ceil(ttl);

        // SET NX EX: exactly one caller observes a non-nil reply.
        let reply: redis::Value = self
            .bounded(
                "SET NX",
                Command::Write,
                redis::cmd("SET")
                    .arg(key.to_string())
                    .arg(1)
                    .arg("NX")
                    .arg("EX")
                    .arg(ttl_seconds)
                    .query_async(&mut conn),
            )
            .await?;

        Ok(!matches!(reply, redis::Value::Nil))
    }
}
