//! Session configuration.
//!
//! Built once at startup and injected into the token operator and the
//! HTTP layer. Secrets are validated eagerly: a missing or shared secret
//! is a [`AuthError::Configuration`] at boot, never a per-request failure.

use crate::constants::{RECOMMENDED_SECRET_LEN, lifetimes, transport};
use crate::error::{AuthError, Result};
use crate::state::StatelessKind;
use chrono::Duration;
use std::fmt;

/// Symmetric secret with a redacted `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// One secret per token class plus the cookie codec key.
#[derive(Debug, Clone)]
pub struct TokenSecrets {
    /// Signs access tokens.
    pub access: Secret,
    /// Signs refresh tokens.
    pub refresh: Secret,
    /// Signs CSRF tokens.
    pub csrf: Secret,
    /// Signs password reset tokens.
    pub password_reset: Secret,
    /// Signs account verification tokens.
    pub account_verification: Secret,
    /// Derives the session cookie encryption key.
    pub cookie: Secret,
}

impl TokenSecrets {
    fn named(&self) -> [(&'static str, &Secret); 6] {
        [
            ("ACCESS_SECRET", &self.access),
            ("REFRESH_SECRET", &self.refresh),
            ("CSRF_SECRET", &self.csrf),
            ("PASSWORD_RESET_SECRET", &self.password_reset),
            ("VALIDATION_SECRET", &self.account_verification),
            ("COOKIE_SECRET", &self.cookie),
        ]
    }

    /// Check that every secret is present and no two classes share one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] on an empty or duplicated secret.
    pub fn validate(&self) -> Result<()> {
        let named = self.named();

        for (name, secret) in &named {
            if secret.as_bytes().is_empty() {
                return Err(AuthError::Configuration(format!("{name} is empty")));
            }
            if secret.as_bytes().len() < RECOMMENDED_SECRET_LEN {
                tracing::warn!(
                    secret = *name,
                    min_len = RECOMMENDED_SECRET_LEN,
                    "Secret is shorter than recommended"
                );
            }
        }

        for (i, (name_a, a)) in named.iter().enumerate() {
            for (name_b, b) in &named[i + 1..] {
                if a == b {
                    return Err(AuthError::Configuration(format!(
                        "{name_a} and {name_b} must differ"
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Lifetime of every token class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    /// Access token lifetime.
    ///
    /// Default: 30 minutes
    pub access: Duration,
    /// Refresh token lifetime.
    ///
    /// Default: 7 days
    pub refresh: Duration,
    /// CSRF token lifetime.
    ///
    /// Default: 30 minutes
    pub csrf: Duration,
    /// Password reset token lifetime.
    ///
    /// Default: 15 minutes
    pub password_reset: Duration,
    /// Account verification token lifetime.
    ///
    /// Default: 7 days
    pub account_verification: Duration,
}

impl TokenLifetimes {
    /// Set access token lifetime.
    #[must_use]
    pub const fn with_access(mut self, lifetime: Duration) -> Self {
        self.access = lifetime;
        self
    }

    /// Set refresh token lifetime.
    #[must_use]
    pub const fn with_refresh(mut self, lifetime: Duration) -> Self {
        self.refresh = lifetime;
        self
    }

    /// Set CSRF token lifetime.
    #[must_use]
    pub const fn with_csrf(mut self, lifetime: Duration) -> Self {
        self.csrf = lifetime;
        self
    }

    /// Set password reset token lifetime.
    #[must_use]
    pub const fn with_password_reset(mut self, lifetime: Duration) -> Self {
        self.password_reset = lifetime;
        self
    }

    /// Set account verification token lifetime.
    #[must_use]
    pub const fn with_account_verification(mut self, lifetime: Duration) -> Self {
        self.account_verification = lifetime;
        self
    }

    /// Lifetime for a stateless token kind.
    #[must_use]
    pub const fn stateless(&self, kind: StatelessKind) -> Duration {
        match kind {
            StatelessKind::PasswordReset => self.password_reset,
            StatelessKind::AccountVerification => self.account_verification,
        }
    }
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::seconds(lifetimes::ACCESS_SECS),
            refresh: Duration::seconds(lifetimes::REFRESH_SECS),
            csrf: Duration::seconds(lifetimes::CSRF_SECS),
            password_reset: Duration::seconds(lifetimes::PASSWORD_RESET_SECS),
            account_verification: Duration::seconds(lifetimes::ACCOUNT_VERIFICATION_SECS),
        }
    }
}

/// Session cookie attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieConfig {
    /// Cookie name.
    pub name: String,
    /// Cookie path.
    pub path: String,
    /// Whether to set the `Secure` attribute.
    ///
    /// Default: true
    pub secure: bool,
    /// Cookie max-age.
    ///
    /// Default: the refresh token lifetime (7 days)
    pub max_age: Duration,
}

impl CookieConfig {
    /// Set the `Secure` attribute.
    #[must_use]
    pub const fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set cookie max-age.
    #[must_use]
    pub const fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set cookie name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: transport::SESSION_COOKIE.to_string(),
            path: "/".to_string(),
            secure: true,
            max_age: Duration::seconds(lifetimes::REFRESH_SECS),
        }
    }
}

/// Session store connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Redis connection URL.
    pub redis_url: String,
    /// Upper bound on every store command.
    ///
    /// Default: 3 seconds
    pub command_timeout: std::time::Duration,
    /// `COUNT` hint for `SCAN`.
    ///
    /// Default: 100
    pub scan_count: usize,
}

impl StoreConfig {
    /// Create store settings for `redis_url`.
    #[must_use]
    pub fn new(redis_url: impl Into<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            ..Self::default()
        }
    }

    /// Set the per-command timeout.
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the `SCAN` batch hint.
    #[must_use]
    pub const fn with_scan_count(mut self, count: usize) -> Self {
        self.scan_count = count;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            command_timeout: std::time::Duration::from_secs(3),
            scan_count: 100,
        }
    }
}

/// Base URLs of the links mailed to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Password reset page. The token is appended as `?token=`.
    pub password_reset_url: String,
    /// Account verification page. The token is appended as `?token=`.
    pub account_verification_url: String,
}

impl LinkConfig {
    /// Derive both links from the application base URL.
    #[must_use]
    pub fn from_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            password_reset_url: format!("{base}/reset-password"),
            account_verification_url: format!("{base}/verify"),
        }
    }

    /// Link for a stateless token.
    #[must_use]
    pub fn link(&self, kind: StatelessKind, token: &str) -> String {
        let base = match kind {
            StatelessKind::PasswordReset => &self.password_reset_url,
            StatelessKind::AccountVerification => &self.account_verification_url,
        };
        format!("{base}?token={token}")
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::from_base_url("http://localhost:3000")
    }
}

/// Complete session configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Signing and cookie secrets.
    pub secrets: TokenSecrets,
    /// Token lifetimes.
    pub lifetimes: TokenLifetimes,
    /// Cookie attributes.
    pub cookie: CookieConfig,
    /// Store settings.
    pub store: StoreConfig,
    /// Mailed link bases.
    pub links: LinkConfig,
}

impl AuthConfig {
    /// Create a configuration with default lifetimes and settings.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the secrets are invalid.
    pub fn new(secrets: TokenSecrets) -> Result<Self> {
        secrets.validate()?;
        Ok(Self {
            secrets,
            lifetimes: TokenLifetimes::default(),
            cookie: CookieConfig::default(),
            store: StoreConfig::default(),
            links: LinkConfig::default(),
        })
    }

    /// Load configuration from process environment variables.
    ///
    /// Required: `ACCESS_SECRET`, `REFRESH_SECRET`, `CSRF_SECRET`,
    /// `PASSWORD_RESET_SECRET`, `VALIDATION_SECRET`, `COOKIE_SECRET`.
    /// Optional: `REDIS_URL`, `STORE_TIMEOUT_SECS`, `COOKIE_SECURE`,
    /// `APP_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if a secret is missing or
    /// invalid, or an optional value does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`AuthConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .map(Secret::new)
                .ok_or_else(|| AuthError::Configuration(format!("{name} is not set")))
        };

        let secrets = TokenSecrets {
            access: required("ACCESS_SECRET")?,
            refresh: required("REFRESH_SECRET")?,
            csrf: required("CSRF_SECRET")?,
            password_reset: required("PASSWORD_RESET_SECRET")?,
            account_verification: required("VALIDATION_SECRET")?,
            cookie: required("COOKIE_SECRET")?,
        };

        let mut config = Self::new(secrets)?;

        if let Some(url) = lookup("REDIS_URL") {
            config.store.redis_url = url;
        }
        if let Some(secs) = lookup("STORE_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|e| {
                AuthError::Configuration(format!("STORE_TIMEOUT_SECS is not a number: {e}"))
            })?;
            config.store.command_timeout = std::time::Duration::from_secs(secs);
        }
        if let Some(secure) = lookup("COOKIE_SECURE") {
            config.cookie.secure = secure.parse().map_err(|e| {
                AuthError::Configuration(format!("COOKIE_SECURE is not a boolean: {e}"))
            })?;
        }
        if let Some(base_url) = lookup("APP_BASE_URL") {
            config.links = LinkConfig::from_base_url(&base_url);
        }

        Ok(config)
    }

    /// Set token lifetimes.
    #[must_use]
    pub const fn with_lifetimes(mut self, lifetimes: TokenLifetimes) -> Self {
        self.lifetimes = lifetimes;
        self
    }

    /// Set cookie attributes.
    #[must_use]
    pub fn with_cookie(mut self, cookie: CookieConfig) -> Self {
        self.cookie = cookie;
        self
    }

    /// Set store settings.
    #[must_use]
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Set mailed link bases.
    #[must_use]
    pub fn with_links(mut self, links: LinkConfig) -> Self {
        self.links = links;
        self
    }
}
