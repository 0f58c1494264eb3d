//! Storage implementations for the session core.
//!
//! - **Session Store** (Redis) - Revocable session family entries with TTL
//!   and single-use markers for stateless tokens

pub mod session_redis;

// Re-exports
pub use session_redis::RedisSessionStore;
