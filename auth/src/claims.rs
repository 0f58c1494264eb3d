//! Claim sets carried by each token class.
//!
//! Store keys are never embedded verbatim. Each claim set carries the
//! correlation base and subject, and the key is rebuilt from those, so a
//! token can only ever name entries owned by its own subject.

use crate::state::{CorrelationBase, Role, StatelessKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims that carry an `exp` timestamp.
pub trait ExpiringClaims {
    /// Expiry as a unix timestamp.
    fn expires_at(&self) -> i64;
}

/// Access token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Correlation base of the session family.
    pub sid: CorrelationBase,
    /// Subject user id.
    pub sub: String,
    /// Role at issue time.
    pub role: Role,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Refresh token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Correlation base of the session family.
    pub rid: CorrelationBase,
    /// Subject user id.
    pub sub: String,
    /// Role at issue time.
    pub role: Role,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// CSRF token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfClaims {
    /// Correlation base of the session family.
    pub cid: CorrelationBase,
    /// Subject user id.
    pub sub: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Password reset / account verification claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatelessClaims {
    /// Subject user id.
    pub sub: String,
    /// Token purpose.
    pub purpose: StatelessKind,
    /// Unique token id, used for single-use enforcement.
    pub jti: Uuid,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

macro_rules! impl_expiring {
    ($($ty:ty),+) => {
        $(impl ExpiringClaims for $ty {
            fn expires_at(&self) -> i64 {
                self.exp
            }
        })+
    };
}

impl_expiring!(AccessClaims, RefreshClaims, CsrfClaims, StatelessClaims);
