//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of all provider traits
//! for use in unit and integration tests, plus a clock that only moves when
//! told to.

pub mod clock;
pub mod email;
pub mod session;
pub mod user;

pub use clock::MockClock;
pub use email::{MockEmailProvider, SentEmail};
pub use session::InMemorySessionStore;
pub use user::{MockPasswordHasher, MockUserRepository};
