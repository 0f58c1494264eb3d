//! Session endpoints.
//!
//! Thin adapters: each handler reads credentials or a JSON body, calls one
//! [`AuthService`](marketplace_auth::AuthService) operation and writes the
//! result back as cookie, header and JSON.

use crate::error::AppError;
use crate::extractors::SessionCredentials;
use crate::state::AppState;
use crate::transport;
use crate::WebResult;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::CookieJar;
use marketplace_auth::providers::{EmailProvider, SessionStore, UserRepository};
use marketplace_auth::{IssuedCredentials, LoginCredentials, Role};
use serde::{Deserialize, Serialize};

/// Identity of a freshly issued session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// User id.
    pub user_id: String,
    /// User role.
    pub role: Role,
}

impl From<&IssuedCredentials> for SessionResponse {
    fn from(issued: &IssuedCredentials) -> Self {
        Self {
            user_id: issued.identity.user_id.to_string(),
            role: issued.identity.role,
        }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

/// Response after logging out everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutAllResponse {
    /// Number of session entries removed.
    pub revoked: u64,
}

/// Request carrying only an email address.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailRequest {
    /// Account email.
    pub email: String,
}

/// Request to set a new password.
#[derive(Clone, Deserialize, Serialize)]
pub struct PasswordResetRequest {
    /// Token from the mailed link.
    pub token: String,
    /// New password.
    pub new_password: String,
}

/// Request to verify an account.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerifyRequest {
    /// Token from the mailed link.
    pub token: String,
}

/// Log in with email and password.
///
/// # Endpoint
///
/// ```text
/// POST /login
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "..."
/// }
/// ```
///
/// # Response
///
/// Sets the session cookie and the `X-CSRF-Token` header.
///
/// ```json
/// {
///   "user_id": "42",
///   "role": "USER"
/// }
/// ```
///
/// # Errors
///
/// 401 for bad credentials, 422 for an unverified account.
pub async fn login<S, U, E>(
    State(state): State<AppState<S, U, E>>,
    jar: CookieJar,
    Json(credentials): Json<LoginCredentials>,
) -> Result<impl IntoResponse, AppError>
where
    S: SessionStore + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + 'static,
{
    let issued = state.auth().login(&credentials).await?;
    let (jar, csrf) = transport::issue(jar, state.auth().cookie_config(), &issued);

    Ok((jar, csrf, Json(SessionResponse::from(&issued))))
}

/// Rotate the session.
///
/// # Endpoint
///
/// ```text
/// POST /refresh
/// Cookie: marketplace-session=...
/// ```
///
/// # Errors
///
/// 401 if the refresh token is missing, revoked or already rotated.
pub async fn refresh<S, U, E>(
    State(state): State<AppState<S, U, E>>,
    jar: CookieJar,
    SessionCredentials(credentials): SessionCredentials,
) -> Result<impl IntoResponse, AppError>
where
    S: SessionStore + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + 'static,
{
    let issued = state.auth().refresh(&credentials).await?;
    let (jar, csrf) = transport::issue(jar, state.auth().cookie_config(), &issued);

    Ok((jar, csrf, Json(SessionResponse::from(&issued))))
}

/// Revoke the current session.
///
/// # Endpoint
///
/// ```text
/// POST /logout
/// Cookie: marketplace-session=...
/// X-CSRF-Token: ...
/// ```
///
/// # Errors
///
/// 401 for invalid credentials.
pub async fn logout<S, U, E>(
    State(state): State<AppState<S, U, E>>,
    jar: CookieJar,
    SessionCredentials(credentials): SessionCredentials,
) -> Result<impl IntoResponse, AppError>
where
    S: SessionStore + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + 'static,
{
    state.auth().logout(&credentials).await?;
    let jar = transport::clear(jar, state.auth().cookie_config());

    Ok((jar, MessageResponse::new("Logged out")))
}

/// Revoke every session of the caller.
///
/// # Endpoint
///
/// ```text
/// POST /logout-all
/// Cookie: marketplace-session=...
/// X-CSRF-Token: ...
/// ```
///
/// # Response
///
/// ```json
/// {
///   "revoked": 9
/// }
/// ```
///
/// # Errors
///
/// 401 for invalid credentials.
pub async fn logout_all<S, U, E>(
    State(state): State<AppState<S, U, E>>,
    jar: CookieJar,
    SessionCredentials(credentials): SessionCredentials,
) -> Result<impl IntoResponse, AppError>
where
    S: SessionStore + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + 'static,
{
    let revoked = state.auth().logout_all(&credentials).await?;
    let jar = transport::clear(jar, state.auth().cookie_config());

    Ok((jar, Json(LogoutAllResponse { revoked })))
}

/// Ask for a password reset link.
///
/// Always 202, whether or not the email belongs to an account.
///
/// # Endpoint
///
/// ```text
/// POST /password-reset/request
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com"
/// }
/// ```
pub async fn request_password_reset<S, U, E>(
    State(state): State<AppState<S, U, E>>,
    Json(request): Json<EmailRequest>,
) -> impl IntoResponse
where
    S: SessionStore + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + 'static,
{
    state.auth().request_password_reset(&request.email).await;

    (
        StatusCode::ACCEPTED,
        MessageResponse::new("If the account exists, a reset link has been sent"),
    )
}

/// Set a new password with a reset token.
///
/// # Endpoint
///
/// ```text
/// POST /password-reset
/// Content-Type: application/json
///
/// {
///   "token": "...",
///   "new_password": "..."
/// }
/// ```
///
/// # Errors
///
/// 400 for an empty password, 401 for an invalid or used token.
pub async fn process_password_reset<S, U, E>(
    State(state): State<AppState<S, U, E>>,
    Json(request): Json<PasswordResetRequest>,
) -> WebResult<Json<MessageResponse>>
where
    S: SessionStore + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + 'static,
{
    if request.new_password.is_empty() {
        return Err(AppError::bad_request("New password must not be empty"));
    }

    state
        .auth()
        .process_password_reset(&request.token, &request.new_password)
        .await?;

    Ok(MessageResponse::new("Password updated"))
}

/// Verify an account with a verification token.
///
/// # Endpoint
///
/// ```text
/// POST /verify
/// Content-Type: application/json
///
/// {
///   "token": "..."
/// }
/// ```
///
/// # Errors
///
/// 401 for an invalid or used token.
pub async fn verify<S, U, E>(
    State(state): State<AppState<S, U, E>>,
    Json(request): Json<VerifyRequest>,
) -> WebResult<Json<MessageResponse>>
where
    S: SessionStore + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + 'static,
{
    state.auth().validate_user(&request.token).await?;

    Ok(MessageResponse::new("Account verified"))
}

/// Ask for an account verification link.
///
/// Always 202.
///
/// # Endpoint
///
/// ```text
/// POST /verify/request
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com"
/// }
/// ```
pub async fn request_verification<S, U, E>(
    State(state): State<AppState<S, U, E>>,
    Json(request): Json<EmailRequest>,
) -> impl IntoResponse
where
    S: SessionStore + 'static,
    U: UserRepository + 'static,
    E: EmailProvider + 'static,
{
    state
        .auth()
        .request_account_verification(&request.email)
        .await;

    (
        StatusCode::ACCEPTED,
        MessageResponse::new("If the account needs verification, a link has been sent"),
    )
}
