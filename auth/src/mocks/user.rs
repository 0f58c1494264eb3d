//! Mock user repository and password hasher for testing.

use crate::error::{AuthError, Result};
use crate::providers::{PasswordHasher, UserRepository};
use crate::state::{User, UserId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Mock user repository.
///
/// Uses in-memory storage for testing.
#[derive(Debug, Clone, Default)]
pub struct MockUserRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl MockUserRepository {
    /// Create a new mock user repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn insert(&self, user: User) -> Result<()> {
        self.users
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .insert(user.id.clone(), user);
        Ok(())
    }

    /// Current copy of a user (for testing).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn user(&self, user_id: &UserId) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?
            .get(user_id)
            .cloned())
    }

    fn update<F>(&self, user_id: &UserId, apply: F) -> Result<()>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self
            .users
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))?;
        let user = users.get_mut(user_id).ok_or(AuthError::UserNotFound)?;
        apply(user);
        Ok(())
    }
}

impl UserRepository for MockUserRepository {
    fn find_by_email(&self, email: &str) -> impl Future<Output = Result<Option<User>>> + Send {
        let result = self
            .users
            .lock()
            .map_err(|_| AuthError::InternalError("Mutex lock failed".to_string()))
            .map(|users| users.values().find(|u| u.email == email).cloned());

        async move { result }
    }

    fn find_by_id(&self, user_id: &UserId) -> impl Future<Output = Result<Option<User>>> + Send {
        let result = self.user(user_id);

        async move { result }
    }

    fn update_password(
        &self,
        user_id: &UserId,
        password_hash: &str,
    ) -> impl Future<Output = Result<()>> + Send {
        let result = self.update(user_id, |user| {
            user.password_hash = password_hash.to_string();
        });

        async move { result }
    }

    fn mark_verified(&self, user_id: &UserId) -> impl Future<Output = Result<()>> + Send {
        let result = self.update(user_id, |user| user.verified = true);

        async move { result }
    }
}

/// Reversible "hasher" for tests: `hash(p) == "mock$" + p`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockPasswordHasher;

impl MockPasswordHasher {
    const PREFIX: &'static str = "mock$";
}

impl PasswordHasher for MockPasswordHasher {
    fn hash(&self, password: &str) -> Result<String> {
        Ok(format!("{}{password}", Self::PREFIX))
    }

    fn verify(&self, password: &str, password_hash: &str) -> bool {
        password_hash
            .strip_prefix(Self::PREFIX)
            .is_some_and(|stored| {
                constant_time_eq::constant_time_eq(stored.as_bytes(), password.as_bytes())
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::Role;

    fn alice() -> User {
        User {
            id: UserId::new("alice"),
            email: "alice@example.com".into(),
            password_hash: MockPasswordHasher.hash("hunter2").unwrap(),
            role: Role::User,
            verified: false,
        }
    }

    #[test]
    fn test_repository_updates() {
        let repo = MockUserRepository::new();
        repo.insert(alice()).unwrap();
        let id = UserId::new("alice");

        tokio_test::block_on(repo.mark_verified(&id)).unwrap();
        tokio_test::block_on(repo.update_password(&id, "mock$new")).unwrap();

        let found = tokio_test::block_on(repo.find_by_email("alice@example.com"))
            .unwrap()
            .unwrap();
        assert!(found.verified);
        assert_eq!(found.password_hash, "mock$new");

        let missing = tokio_test::block_on(repo.mark_verified(&UserId::new("bob")));
        assert_eq!(missing.unwrap_err(), AuthError::UserNotFound);
    }

    #[test]
    fn test_hasher_verifies_only_matching_password() {
        let hash = MockPasswordHasher.hash("hunter2").unwrap();
        assert!(MockPasswordHasher.verify("hunter2", &hash));
        assert!(!MockPasswordHasher.verify("hunter3", &hash));
        assert!(!MockPasswordHasher.verify("hunter2", "hunter2"));
    }
}
