//! Custom Axum extractors.
//!
//! - `SessionCredentials`: the session cookie and `X-CSRF-Token` header of
//!   a request, decoded into [`RequestCredentials`]
//!
//! Extraction never fails. Missing or undecodable credentials are simply
//! absent, and the service operation that needs them rejects the request.
//!
//! # Examples
//!
//! ```ignore
//! use marketplace_web::extractors::SessionCredentials;
//!
//! async fn handler(
//!     State(state): State<AppState<S, U, E>>,
//!     SessionCredentials(credentials): SessionCredentials,
//! ) -> Result<Json<Response>, AppError> {
//!     let identity = state.auth().validate_credentials(&credentials).await?;
//!     Ok(Json(response))
//! }
//! ```

use crate::state::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use marketplace_auth::constants::transport::CSRF_HEADER;
use marketplace_auth::providers::{EmailProvider, SessionStore, UserRepository};
use marketplace_auth::{AuthService, RequestCredentials};

/// Credentials carried by the request.
#[derive(Debug, Clone)]
pub struct SessionCredentials(pub RequestCredentials);

#[async_trait]
impl<S, U, E> FromRequestParts<AppState<S, U, E>> for SessionCredentials
where
    S: SessionStore + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + 'static,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S, U, E>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(read_credentials(state.auth(), &parts.headers)))
    }
}

/// Decode the session cookie and CSRF header from `headers`.
pub(crate) fn read_credentials<S, U, E>(
    auth: &AuthService<S, U, E>,
    headers: &HeaderMap,
) -> RequestCredentials
where
    S: SessionStore,
    U: UserRepository,
    E: EmailProvider,
{
    let jar = CookieJar::from_headers(headers);
    let cookie_value = jar.get(auth.codec().cookie_name()).map(|c| c.value());
    let csrf_header = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok());

    auth.read_credentials(cookie_value, csrf_header)
}
