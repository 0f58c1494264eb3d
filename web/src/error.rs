//! Error types for web handlers.
//!
//! This module defines error types that bridge between session core errors
//! and HTTP responses, implementing Axum's `IntoResponse` trait.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use marketplace_auth::AuthError;
use serde::Serialize;
use std::fmt;

/// Message for every authentication failure, whatever the cause.
pub const UNAUTHENTICATED_MESSAGE: &str = "Invalid or expired credentials";

/// Application error type for web handlers.
///
/// This type wraps core errors and provides HTTP-friendly error responses.
/// It implements Axum's `IntoResponse` trait to automatically convert errors
/// into HTTP responses.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState<S, U, E>>) -> Result<Json<Data>, AppError> {
///     let identity = state.auth().validate_credentials(&request).await?;
///     Ok(Json(data))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            message.into(),
            "FORBIDDEN".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// Create a 503 Service Unavailable error.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            message.into(),
            "SERVICE_UNAVAILABLE".to_string(),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Map core errors onto HTTP.
///
/// Every authentication failure becomes the same 401 so that responses do
/// not reveal which check failed.
impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated
            | AuthError::InvalidCredentials
            | AuthError::UserNotFound => {
                Self::unauthorized(UNAUTHENTICATED_MESSAGE)
            }
            AuthError::Forbidden => Self::forbidden("Insufficient role"),
            AuthError::AccountNotVerified => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Account not verified".to_string(),
                "ACCOUNT_NOT_VERIFIED".to_string(),
            ),
            AuthError::StoreUnavailable(_) => {
                Self::unavailable("Session store unavailable").with_source(err.into())
            }
            AuthError::StoreWrite(_)
            | AuthError::Configuration(_)
            | AuthError::Repository(_)
            | AuthError::EmailDeliveryFailed
            | AuthError::Serialization(_)
            | AuthError::InternalError(_) => {
                Self::internal("An internal error occurred").with_source(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_auth_failures_are_uniform() {
        let errors = [
            AuthError::Unauthenticated,
            AuthError::InvalidCredentials,
            AuthError::UserNotFound,
        ];

        for err in errors {
            let app: AppError = err.into();
            assert_eq!(app.status, StatusCode::UNAUTHORIZED);
            assert_eq!(app.message, UNAUTHENTICATED_MESSAGE);
            assert!(app.source.is_none());
        }
    }

    #[test]
    fn test_auth_error_statuses() {
        let cases = [
            (AuthError::Forbidden, StatusCode::FORBIDDEN),
            (AuthError::AccountNotVerified, StatusCode::UNPROCESSABLE_ENTITY),
            (
                AuthError::StoreUnavailable("timeout".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AuthError::StoreWrite("OOM".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AuthError::InternalError("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status, status);
        }
    }

    #[test]
    fn test_internal_detail_not_in_message() {
        let app = AppError::from(AuthError::Repository("connection reset by peer".into()));
        assert!(!app.message.contains("peer"));
        assert!(app.source.is_some());
    }
}
