use std::sync::Arc;

use thiserror::Error;

use super::password::{HashError, PasswordHasher};
use crate::db::{MemoryStore, Role, SharedStore, StoreError, UserRecord};

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Username already registered: {0}")]
    Duplicate(String),
    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Everything needed to create an account.
#[derive(Debug, Clone)]
pub struct NewUser<P> {
    pub username: String,
    pub password: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub profile: P,
}

/// The user table of one app together with the hasher that guards it.
pub struct Credentials<P> {
    users: SharedStore<String, UserRecord<P>>,
    hasher: Arc<dyn PasswordHasher>,
}

impl<P> Clone for Credentials<P> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            hasher: self.hasher.clone(),
        }
    }
}

impl<P: Clone + Send + Sync + 'static> Credentials<P> {
    pub fn new(hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            users: MemoryStore::shared(),
            hasher,
        }
    }

    pub fn users(&self) -> &SharedStore<String, UserRecord<P>> {
        &self.users
    }

    /// Hash off the async runtime; argon2 is deliberately slow.
    pub async fn hash_password(&self, password: &str) -> Result<String, HashError> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| HashError::Task(e.to_string()))?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .unwrap_or(false)
    }

    pub async fn register(&self, user: NewUser<P>) -> Result<UserRecord<P>, CredentialError> {
        if self.users.contains(&user.username) {
            return Err(CredentialError::Duplicate(user.username));
        }

        let password_hash = self.hash_password(&user.password).await?;
        let record = UserRecord {
            username: user.username,
            password_hash,
            full_name: user.full_name,
            role: user.role,
            disabled: false,
            profile: user.profile,
        };

        // a concurrent registration may have won while we were hashing
        match self.users.insert(record.username.clone(), record.clone()) {
            Ok(()) => Ok(record),
            Err(StoreError::Duplicate) => Err(CredentialError::Duplicate(record.username)),
        }
    }

    /// The user if the password matches. Unknown user and wrong password are
    /// indistinguishable to the caller.
    pub async fn authenticate(&self, username: &str, password: &str) -> Option<UserRecord<P>> {
        let user = self.users.get(&username.to_string())?;
        if self.verify_password(password, &user.password_hash).await {
            Some(user)
        } else {
            None
        }
    }

    pub fn find(&self, username: &str) -> Option<UserRecord<P>> {
        self.users.get(&username.to_string())
    }

    pub fn exists(&self, username: &str) -> bool {
        self.users.contains(&username.to_string())
    }

    /// Run `f` on the stored profile under the store's write lock.
    pub fn update_profile<R>(&self, username: &str, f: impl FnOnce(&mut P) -> R) -> Option<R> {
        self.users
            .update(&username.to_string(), |user| f(&mut user.profile))
    }

    pub fn set_disabled(&self, username: &str, disabled: bool) -> bool {
        self.users
            .update(&username.to_string(), |user| user.disabled = disabled)
            .is_some()
    }
}
