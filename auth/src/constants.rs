//! Session constants.
//!
//! Names shared by the core and the HTTP binding, plus the default
//! lifetimes of every token class.

/// Transport names.
pub mod transport {
    /// Request/response header that carries the CSRF token.
    pub const CSRF_HEADER: &str = "X-CSRF-Token";

    /// Default name of the encrypted session cookie.
    pub const SESSION_COOKIE: &str = "marketplace-session";
}

/// Session store key namespaces.
pub mod keys {
    /// Prefix of every session family entry.
    pub const SESSION_PREFIX: &str = "auth:session";

    /// Prefix of consumed stateless-token markers.
    pub const CONSUMED_PREFIX: &str = "auth:consumed";
}

/// Default token lifetimes in seconds.
pub mod lifetimes {
    /// Access token: 30 minutes.
    pub const ACCESS_SECS: i64 = 30 * 60;

    /// Refresh token: 7 days.
    pub const REFRESH_SECS: i64 = 7 * 24 * 60 * 60;

    /// CSRF token: 30 minutes.
    pub const CSRF_SECS: i64 = 30 * 60;

    /// Password reset token: 15 minutes.
    pub const PASSWORD_RESET_SECS: i64 = 15 * 60;

    /// Account verification token: 7 days.
    pub const ACCOUNT_VERIFICATION_SECS: i64 = 7 * 24 * 60 * 60;
}

/// Secrets shorter than this are accepted with a warning.
pub const RECOMMENDED_SECRET_LEN: usize = 32;
