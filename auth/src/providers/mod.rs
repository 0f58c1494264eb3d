//! Session core providers.
//!
//! This module defines traits for every external dependency of the
//! session core. These traits enable dependency injection and make the
//! token logic testable.
//!
//! # Architecture
//!
//! Providers are **interfaces**, not implementations. The token operator
//! and the auth service depend on these traits; the application wires in
//! concrete implementations.
//!
//! ```text
//! ┌──────────────────┐   put/get/delete/scan   ┌──────────────────┐
//! │ TokenOperator    │ ──────────────────────▶ │ SessionStore     │
//! └────────┬─────────┘                          │ (Redis)          │
//!          │                                    └──────────────────┘
//! ┌────────▼─────────┐   lookup/update         ┌──────────────────┐
//! │ AuthService      │ ──────────────────────▶ │ UserRepository   │
//! │                  │ ──────────────────────▶ │ PasswordHasher   │
//! │                  │ ──────────────────────▶ │ EmailProvider    │
//! └──────────────────┘                          └──────────────────┘
//! ```
//!
//! This enables:
//! - **Testing**: Use mocks (in-memory, deterministic)
//! - **Production**: Use real services (Redis, SQL, SMTP)
//! - **Development**: Use [`ConsoleEmailProvider`]

pub mod console_email;
pub mod email;
pub mod session;
pub mod user;

pub use console_email::ConsoleEmailProvider;
pub use email::EmailProvider;
pub use session::SessionStore;
pub use user::{PasswordHasher, UserRepository};
