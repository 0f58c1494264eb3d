//! Axum binding of the marketplace session core.
//!
//! This crate exposes the operations of
//! [`AuthService`](marketplace_auth::AuthService) as HTTP endpoints and
//! provides a middleware that gates other routers on a valid session.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         HTTP Shell (Axum)               │  ← cookies, X-CSRF-Token,
//! │  - Credential extraction                │    JSON, status codes
//! │  - Cookie/header writing                │
//! ├─────────────────────────────────────────┤
//! │         Session Core (marketplace-auth) │
//! │  - Token signing and verification       │  ← transport-agnostic
//! │  - Revocable session store              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at Axum handler
//! 2. **Extract** session cookie and `X-CSRF-Token` header
//! 3. **Call** one `AuthService` operation
//! 4. **Map result** to HTTP response (cookie, header, JSON, or `AppError`)
//!
//! # Example
//!
//! ```ignore
//! use marketplace_web::{auth_router, middleware::require_session, AppState};
//!
//! let state = AppState::new(service);
//! let app = Router::new()
//!     .route("/orders", get(list_orders))
//!     .layer(require_session(state.clone()))
//!     .nest("/auth", auth_router(state));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
pub mod transport;

#[cfg(test)]
mod test_support;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::SessionCredentials;
pub use middleware::{require_role, require_session};
pub use router::auth_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
