//! Session router composition.
//!
//! Composes all session handlers into a single Axum router.

use crate::handlers::auth;
use crate::state::AppState;
use axum::{routing::post, Router};
use marketplace_auth::providers::{EmailProvider, SessionStore, UserRepository};
use tower_http::trace::TraceLayer;

/// Create the session router.
///
/// # Routes
///
/// ## Sessions
/// - `POST /login` - Log in, set cookie and CSRF header
/// - `POST /refresh` - Rotate the session
/// - `POST /logout` - Revoke the current session
/// - `POST /logout-all` - Revoke every session of the caller
///
/// ## Password reset
/// - `POST /password-reset/request` - Mail a reset link
/// - `POST /password-reset` - Set a new password
///
/// ## Account verification
/// - `POST /verify/request` - Mail a verification link
/// - `POST /verify` - Verify the account
///
/// # Example
///
/// ```rust,ignore
/// let service = AuthService::new(&config, store, users, hasher, email, clock)?;
///
/// let app = Router::new()
///     .nest("/api/v1/auth", auth_router(AppState::new(service)));
/// ```
pub fn auth_router<S, U, E>(state: AppState<S, U, E>) -> Router
where
    S: SessionStore + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + 'static,
{
    Router::new()
        // Session routes
        .route("/login", post(auth::login::<S, U, E>))
        .route("/refresh", post(auth::refresh::<S, U, E>))
        .route("/logout", post(auth::logout::<S, U, E>))
        .route("/logout-all", post(auth::logout_all::<S, U, E>))
        // Password reset routes
        .route(
            "/password-reset/request",
            post(auth::request_password_reset::<S, U, E>),
        )
        .route(
            "/password-reset",
            post(auth::process_password_reset::<S, U, E>),
        )
        // Account verification routes
        .route("/verify/request", post(auth::request_verification::<S, U, E>))
        .route("/verify", post(auth::verify::<S, U, E>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
