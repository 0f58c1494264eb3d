//! Axum middleware gating routes on a valid session.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Extension, Router, routing::get};
//! use marketplace_auth::{Identity, Role};
//! use marketplace_web::middleware::{require_role, require_session};
//!
//! let app = Router::new()
//!     .route("/orders", get(list_orders))
//!     .layer(require_session(state.clone()))
//!     .merge(
//!         Router::new()
//!             .route("/admin/users", get(list_users))
//!             .layer(require_role(state, &[Role::Admin])),
//!     );
//!
//! async fn list_orders(Extension(identity): Extension<Identity>) -> String {
//!     identity.user_id.to_string()
//! }
//! ```
//!
//! # Flow
//!
//! 1. **Read** the session cookie and `X-CSRF-Token` header
//! 2. **Validate** them against the session store
//! 3. **Reject** with 401 (or 403 for a missing role), or
//! 4. **Store** the [`Identity`](marketplace_auth::Identity) in request
//!    extensions and call the inner service

use crate::error::AppError;
use crate::extractors::read_credentials;
use crate::state::AppState;
use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use marketplace_auth::providers::{EmailProvider, SessionStore, UserRepository};
use marketplace_auth::Role;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Create a layer that admits only requests with a valid session.
#[must_use]
pub fn require_session<S, U, E>(state: AppState<S, U, E>) -> RequireSessionLayer<S, U, E> {
    RequireSessionLayer {
        state,
        roles: Arc::from([]),
    }
}

/// Create a layer that admits only sessions holding one of `roles`.
#[must_use]
pub fn require_role<S, U, E>(
    state: AppState<S, U, E>,
    roles: &[Role],
) -> RequireSessionLayer<S, U, E> {
    RequireSessionLayer {
        state,
        roles: Arc::from(roles),
    }
}

/// Layer for session gating.
pub struct RequireSessionLayer<S, U, E> {
    state: AppState<S, U, E>,
    /// Empty means any role.
    roles: Arc<[Role]>,
}

impl<S, U, E> Clone for RequireSessionLayer<S, U, E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            roles: Arc::clone(&self.roles),
        }
    }
}

impl<Inner, S, U, E> Layer<Inner> for RequireSessionLayer<S, U, E> {
    type Service = RequireSession<Inner, S, U, E>;

    fn layer(&self, inner: Inner) -> Self::Service {
        RequireSession {
            inner,
            state: self.state.clone(),
            roles: Arc::clone(&self.roles),
        }
    }
}

/// Middleware service for session gating.
pub struct RequireSession<Inner, S, U, E> {
    inner: Inner,
    state: AppState<S, U, E>,
    roles: Arc<[Role]>,
}

impl<Inner: Clone, S, U, E> Clone for RequireSession<Inner, S, U, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            state: self.state.clone(),
            roles: Arc::clone(&self.roles),
        }
    }
}

impl<Inner, S, U, E> Service<Request> for RequireSession<Inner, S, U, E>
where
    Inner: Service<Request, Response = Response> + Clone + Send + 'static,
    Inner::Future: Send + 'static,
    S: SessionStore + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + 'static,
{
    type Response = Response;
    type Error = Inner::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        // The ready service goes with this request
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let state = self.state.clone();
        let roles = Arc::clone(&self.roles);

        Box::pin(async move {
            let credentials = read_credentials(state.auth(), req.headers());

            let result = if roles.is_empty() {
                state.auth().validate_credentials(&credentials).await
            } else {
                state.auth().require_role(&credentials, &roles).await
            };

            match result {
                Ok(identity) => {
                    req.extensions_mut().insert(identity);
                    inner.call(req).await
                }
                Err(e) => {
                    tracing::debug!(
                        uri = %req.uri(),
                        error = %e,
                        "Request rejected by session gate"
                    );
                    Ok(AppError::from(e).into_response())
                }
            }
        })
    }
}
