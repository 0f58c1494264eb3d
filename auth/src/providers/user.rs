//! User repository and password hashing traits.

use crate::error::Result;
use crate::state::{User, UserId};

/// User repository.
///
/// This trait abstracts over the marketplace user table.
pub trait UserRepository: Send + Sync {
    /// Get user by email.
    ///
    /// # Returns
    ///
    /// The user, or `None` if no account uses this email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the query fails.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>>> + Send;

    /// Get user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the query fails.
    fn find_by_id(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<User>>> + Send;

    /// Replace the stored password hash.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Database query fails
    /// - User not found → `AuthError::UserNotFound`
    fn update_password(
        &self,
        user_id: &UserId,
        password_hash: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Set the verified flag.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Database query fails
    /// - User not found → `AuthError::UserNotFound`
    fn mark_verified(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash a new password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InternalError` if hashing fails.
    fn hash(&self, password: &str) -> Result<String>;

    /// Check `password` against a stored hash.
    fn verify(&self, password: &str, password_hash: &str) -> bool;
}
