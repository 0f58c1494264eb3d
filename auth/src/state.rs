//! Session data model.
//!
//! Identity types, the structured session-store keys that replace
//! delimiter-joined correlation ids, and the request-scoped details
//! produced by token extraction.

use crate::constants::keys::{CONSUMED_PREFIX, SESSION_PREFIX};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════════════
// Identity
// ═══════════════════════════════════════════════════════════════════════

/// Identifier of a user, as issued by the user repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Wrap a repository identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn encoded(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0.as_bytes())
    }

    fn decode(encoded: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
        String::from_utf8(bytes).ok().map(Self)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Marketplace role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular customer.
    User,
    /// Content moderator.
    Moderator,
    /// Administrator.
    Admin,
}

impl Role {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Moderator => "MODERATOR",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Self::User),
            "MODERATOR" => Ok(Self::Moderator),
            "ADMIN" => Ok(Self::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Validated caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Authenticated user.
    pub user_id: UserId,
    /// Role embedded in the access token.
    pub role: Role,
}

impl Identity {
    /// Returns `true` if the caller holds one of `roles`.
    #[must_use]
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

/// User record as seen by the session core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Identifier.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Stored password hash.
    pub password_hash: String,
    /// Role.
    pub role: Role,
    /// Whether the account has been verified.
    pub verified: bool,
}

/// Email/password login request.
#[derive(Clone, Deserialize)]
pub struct LoginCredentials {
    /// Login email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Session keys
// ═══════════════════════════════════════════════════════════════════════

/// Random value shared by one login's access, refresh and CSRF tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationBase(pub Uuid);

impl CorrelationBase {
    /// Generate a new random base.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationBase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Member of a session family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Access token entry.
    Access,
    /// Refresh token entry.
    Refresh,
    /// CSRF token entry.
    Csrf,
}

impl TokenKind {
    /// All family members.
    pub const ALL: [Self; 3] = [Self::Access, Self::Refresh, Self::Csrf];

    /// Key segment for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
            Self::Csrf => "csrf",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "access" => Some(Self::Access),
            "refresh" => Some(Self::Refresh),
            "csrf" => Some(Self::Csrf),
            _ => None,
        }
    }
}

/// Session store key of one family member.
///
/// Rendered as `auth:session:{kind}:{base64url(user)}:{base}`. The user
/// segment is base64url so it can never contain `:` or a glob
/// metacharacter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    kind: TokenKind,
    base: CorrelationBase,
    user_id: UserId,
}

impl SessionKey {
    /// Build a key.
    #[must_use]
    pub const fn new(kind: TokenKind, base: CorrelationBase, user_id: UserId) -> Self {
        Self {
            kind,
            base,
            user_id,
        }
    }

    /// Family member this key belongs to.
    #[must_use]
    pub const fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Correlation base.
    #[must_use]
    pub const fn base(&self) -> CorrelationBase {
        self.base
    }

    /// Owner.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Key of another member of the same family.
    #[must_use]
    pub fn sibling(&self, kind: TokenKind) -> Self {
        Self::new(kind, self.base, self.user_id.clone())
    }

    /// Parse a rendered key.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix(SESSION_PREFIX)?.strip_prefix(':')?;
        let mut parts = rest.split(':');
        let kind = TokenKind::parse(parts.next()?)?;
        let user_id = UserId::decode(parts.next()?)?;
        let base = Uuid::parse_str(parts.next()?).ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(kind, CorrelationBase(base), user_id))
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SESSION_PREFIX}:{}:{}:{}",
            self.kind.as_str(),
            self.user_id.encoded(),
            self.base
        )
    }
}

/// Match-pattern over every family member of one kind for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeyPattern {
    kind: TokenKind,
    user_id: UserId,
}

impl SessionKeyPattern {
    /// Pattern for `kind` entries owned by `user_id`.
    #[must_use]
    pub const fn new(kind: TokenKind, user_id: UserId) -> Self {
        Self { kind, user_id }
    }

    /// Returns `true` if `key` is covered by this pattern.
    #[must_use]
    pub fn matches(&self, key: &SessionKey) -> bool {
        key.kind == self.kind && key.user_id == self.user_id
    }
}

impl fmt::Display for SessionKeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SESSION_PREFIX}:{}:{}:*",
            self.kind.as_str(),
            self.user_id.encoded()
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Token family
// ═══════════════════════════════════════════════════════════════════════

/// One signed token together with its store entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Compact signed token.
    pub token: String,
    /// Store key this token is revocable through.
    pub key: SessionKey,
    /// Value of the `exp` claim.
    pub expires_at: DateTime<Utc>,
}

/// Correlated access, refresh and CSRF tokens of one login or refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDetails {
    /// Shared correlation base.
    pub base: CorrelationBase,
    /// Owner.
    pub user_id: UserId,
    /// Role embedded in the access and refresh tokens.
    pub role: Role,
    /// Access token.
    pub access: IssuedToken,
    /// Refresh token.
    pub refresh: IssuedToken,
    /// CSRF token.
    pub csrf: IssuedToken,
}

impl TokenDetails {
    /// All three tokens.
    #[must_use]
    pub const fn tokens(&self) -> [&IssuedToken; 3] {
        [&self.access, &self.refresh, &self.csrf]
    }
}

/// Result of validating an access/CSRF pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDetails {
    /// Access entry key.
    pub session_key: SessionKey,
    /// CSRF entry key.
    pub csrf_key: SessionKey,
    /// Owner.
    pub user_id: UserId,
    /// Role.
    pub role: Role,
}

impl AccessDetails {
    /// Refresh entry of the same family.
    #[must_use]
    pub fn refresh_key(&self) -> SessionKey {
        self.session_key.sibling(TokenKind::Refresh)
    }

    /// Caller identity.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id.clone(),
            role: self.role,
        }
    }
}

/// Result of verifying a refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshDetails {
    /// Refresh entry key.
    pub refresh_key: SessionKey,
    /// Owner.
    pub user_id: UserId,
    /// Role.
    pub role: Role,
}

// ═══════════════════════════════════════════════════════════════════════
// Stateless tokens
// ═══════════════════════════════════════════════════════════════════════

/// Purpose of a stateless token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatelessKind {
    /// Password reset link.
    PasswordReset,
    /// Account verification link.
    AccountVerification,
}

impl StatelessKind {
    /// Key segment for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PasswordReset => "password_reset",
            Self::AccountVerification => "account_verification",
        }
    }
}

/// Verified contents of a stateless token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatelessDetails {
    /// Subject.
    pub user_id: UserId,
    /// Purpose.
    pub kind: StatelessKind,
    /// Unique token id.
    pub jti: Uuid,
    /// Value of the `exp` claim.
    pub expires_at: DateTime<Utc>,
}

impl StatelessDetails {
    /// Marker key recording this token as used.
    #[must_use]
    pub const fn consumed_key(&self) -> ConsumedTokenKey {
        ConsumedTokenKey {
            kind: self.kind,
            jti: self.jti,
        }
    }
}

/// Marker of a stateless token that has already been used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsumedTokenKey {
    /// Purpose.
    pub kind: StatelessKind,
    /// Token id.
    pub jti: Uuid,
}

impl fmt::Display for ConsumedTokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CONSUMED_PREFIX}:{}:{}", self.kind.as_str(), self.jti)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_parse_inverts_display() {
        let key = SessionKey::new(
            TokenKind::Csrf,
            CorrelationBase::new(),
            UserId::new("user:with*glob?chars"),
        );

        let parsed = SessionKey::parse(&key.to_string()).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_user_segment_has_no_delimiters() {
        let key = SessionKey::new(
            TokenKind::Access,
            CorrelationBase::new(),
            UserId::new("a:b*c[d]"),
        );

        let rendered = key.to_string();
        assert_eq!(rendered.matches(':').count(), 4);
        assert!(!rendered.contains('*'));
        assert!(!rendered.contains('['));
    }

    #[test]
    fn test_pattern_renders_trailing_wildcard() {
        let user = UserId::new("42");
        let pattern = SessionKeyPattern::new(TokenKind::Refresh, user.clone());
        let key = SessionKey::new(TokenKind::Refresh, CorrelationBase::new(), user);

        let rendered = pattern.to_string();
        assert!(rendered.ends_with(":*"));
        assert!(key.to_string().starts_with(rendered.trim_end_matches('*')));
        assert!(pattern.matches(&key));
    }

    #[test]
    fn test_pattern_does_not_match_other_user_or_kind() {
        let pattern = SessionKeyPattern::new(TokenKind::Access, UserId::new("1"));
        let base = CorrelationBase::new();

        assert!(!pattern.matches(&SessionKey::new(TokenKind::Access, base, UserId::new("10"))));
        assert!(!pattern.matches(&SessionKey::new(TokenKind::Csrf, base, UserId::new("1"))));
    }

    #[test]
    fn test_parse_rejects_foreign_keys() {
        assert!(SessionKey::parse("session:abc").is_none());
        let bogus_kind = "auth:session:bogus:MQ:00000000-0000-0000-0000-000000000000";
        assert!(SessionKey::parse(bogus_kind).is_none());
        assert!(SessionKey::parse("auth:session:access:MQ:not-a-uuid").is_none());
    }

    #[test]
    fn test_sibling_keeps_family() {
        let key = SessionKey::new(TokenKind::Access, CorrelationBase::new(), UserId::new("7"));
        let refresh = key.sibling(TokenKind::Refresh);

        assert_eq!(refresh.base(), key.base());
        assert_eq!(refresh.user_id(), key.user_id());
        assert_eq!(refresh.kind(), TokenKind::Refresh);
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Moderator).unwrap(), "\"MODERATOR\"");
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_login_credentials_debug_hides_password() {
        let creds = LoginCredentials {
            email: "a@example.com".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
