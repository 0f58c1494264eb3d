//! Application state for Axum handlers.

use marketplace_auth::AuthService;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Wraps the session service in an `Arc`, so cloning the state per request
/// is cheap and the collaborators themselves need not be `Clone`.
///
/// # Examples
///
/// ```ignore
/// let service = AuthService::new(&config, store, users, hasher, email, clock)?;
/// let app = Router::new()
///     .nest("/auth", auth_router(AppState::new(service)));
/// ```
pub struct AppState<S, U, E> {
    auth: Arc<AuthService<S, U, E>>,
}

impl<S, U, E> AppState<S, U, E> {
    /// Create a new application state.
    #[must_use]
    pub fn new(auth: AuthService<S, U, E>) -> Self {
        Self {
            auth: Arc::new(auth),
        }
    }

    /// Session service.
    #[must_use]
    pub fn auth(&self) -> &AuthService<S, U, E> {
        &self.auth
    }
}

impl<S, U, E> Clone for AppState<S, U, E> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
        }
    }
}
