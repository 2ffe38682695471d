//! User account records.
//!
//! The ticket engine only ever needs the narrow [`UserRecord`] shape; where
//! the records live is up to the [`UserRecordLookup`] implementation.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::password::HashedPassword;

/// Account state consulted during credential checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub account_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub credentials_expire_at: Option<DateTime<Utc>>,
    pub password: HashedPassword,
}

impl UserRecord {
    /// An enabled, unlocked, non-expiring account.
    pub fn new(user_name: impl Into<String>, password: HashedPassword) -> Self {
        Self {
            user_name: user_name.into(),
            enabled: true,
            locked: false,
            account_expires_at: None,
            credentials_expire_at: None,
            password,
        }
    }

    pub fn account_expired(&self, now: DateTime<Utc>) -> bool {
        self.account_expires_at.is_some_and(|at| at < now)
    }

    pub fn credentials_expired(&self, now: DateTime<Utc>) -> bool {
        self.credentials_expire_at.is_some_and(|at| at < now)
    }
}

fn default_true() -> bool {
    true
}

/// Read access to user accounts.
pub trait UserRecordLookup: Send + Sync {
    fn lookup(&self, user_name: &str) -> Option<UserRecord>;

    fn user_exists(&self, user_name: &str) -> bool {
        self.lookup(user_name).is_some()
    }
}

/// Read/write access to user accounts.
pub trait UserAccountStore: UserRecordLookup {
    /// # Errors
    ///
    /// [`AuthError::UserExists`] if an account with the same name exists.
    fn create(&self, record: UserRecord) -> AuthResult<()>;

    /// Applies `change` to the named account.
    ///
    /// # Errors
    ///
    /// [`AuthError::UserNotFound`] if there is no such account.
    fn update(&self, user_name: &str, change: &mut dyn FnMut(&mut UserRecord)) -> AuthResult<()>;

    fn delete(&self, user_name: &str) -> AuthResult<()>;

    fn user_names(&self) -> Vec<String>;
}

/// Accounts held in a concurrent in-process map.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: DashMap<String, UserRecord>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from seed records. Later duplicates replace earlier ones.
    pub fn with_users(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.users.insert(record.user_name.clone(), record);
        }
        store
    }
}

impl UserRecordLookup for InMemoryUserStore {
    fn lookup(&self, user_name: &str) -> Option<UserRecord> {
        self.users.get(user_name).map(|entry| entry.clone())
    }

    fn user_exists(&self, user_name: &str) -> bool {
        self.users.contains_key(user_name)
    }
}

impl UserAccountStore for InMemoryUserStore {
    fn create(&self, record: UserRecord) -> AuthResult<()> {
        match self.users.entry(record.user_name.clone()) {
            Entry::Occupied(_) => Err(AuthError::UserExists(record.user_name)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    fn update(&self, user_name: &str, change: &mut dyn FnMut(&mut UserRecord)) -> AuthResult<()> {
        let mut entry = self
            .users
            .get_mut(user_name)
            .ok_or_else(|| AuthError::UserNotFound(user_name.to_string()))?;
        change(entry.value_mut());
        Ok(())
    }

    fn delete(&self, user_name: &str) -> AuthResult<()> {
        self.users
            .remove(user_name)
            .map(|_| ())
            .ok_or_else(|| AuthError::UserNotFound(user_name.to_string()))
    }

    fn user_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.users.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
