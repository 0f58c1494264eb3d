//! # Marketplace Auth
//!
//! Token and session core of the marketplace: issues signed, short-lived
//! credentials, tracks them in a revocable session store, and validates
//! them on every request.
//!
//! ## Features
//!
//! - **Session families**: access, refresh and CSRF tokens sharing one
//!   correlation base, each backed by a store entry with a TTL
//! - **Revocable**: a token is valid only while its store entry exists
//! - **Single-use refresh**: rotation deletes the old refresh entry first,
//!   so concurrent refreshes have exactly one winner
//! - **Stateless tokens**: signed password reset and account verification
//!   links, consumed once
//! - **Testable**: every collaborator is a trait with an in-memory mock
//!
//! ## Architecture
//!
//! ```text
//! RequestCredentials → AuthService → TokenOperator → SessionStore
//!                          │              │
//!                          │              └── TokenSigner (HS256, one secret per class)
//!                          └── UserRepository / PasswordHasher / EmailProvider
//! ```
//!
//! ## Example: Login and validate
//!
//! ```rust,ignore
//! use marketplace_auth::*;
//!
//! let issued = service.login(&credentials).await?;
//!
//! // Later, on another request
//! let request = service.read_credentials(Some(&issued.cookie_value), Some(&issued.csrf_token));
//! let identity = service.validate_credentials(&request).await?;
//! assert_eq!(identity.user_id, issued.identity.user_id);
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod claims;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod providers;
pub mod service;
pub mod signer;
pub mod state;
pub mod stores;
pub mod token;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use clock::{Clock, SystemClock};
pub use config::AuthConfig;
pub use error::{AuthError, Result};
pub use service::AuthService;
pub use state::{Identity, LoginCredentials, Role, User, UserId};
pub use token::TokenOperator;
pub use transport::{CookieCodec, IssuedCredentials, RequestCredentials};
