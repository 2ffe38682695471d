//! Authenticator backed by a [`UserAccountStore`].
//!
//! This is the chain's mutable member: besides checking credentials it can
//! create, update and delete accounts, and it re-encodes legacy password
//! hashes after a successful login.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::chain::{Authenticator, MutableAuthenticator};
use crate::clock::Clock;
use crate::config::IdentityConfig;
use crate::error::{AuthError, AuthResult};
use crate::mask_user_name;
use crate::password::CompositePasswordEncoder;
use crate::users::{UserAccountStore, UserRecord};

pub struct RepositoryAuthenticator {
    store: Arc<dyn UserAccountStore>,
    encoder: CompositePasswordEncoder,
    clock: Arc<dyn Clock>,
    admin_names: BTreeSet<String>,
    guest_names: BTreeSet<String>,
    system_name: String,
    allow_guest_login: bool,
}

impl RepositoryAuthenticator {
    pub fn new(
        store: Arc<dyn UserAccountStore>,
        encoder: CompositePasswordEncoder,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            encoder,
            clock,
            admin_names: BTreeSet::new(),
            guest_names: BTreeSet::new(),
            system_name: IdentityConfig::default().system_user_name,
            allow_guest_login: false,
        }
    }

    /// Takes admin names, the reserved names and guest support from `identities`.
    pub fn with_identities(mut self, identities: &IdentityConfig) -> Self {
        self.admin_names = identities.admin_user_names.iter().cloned().collect();
        self.guest_names = BTreeSet::from([identities.guest_user_name.clone()]);
        self.system_name = identities.system_user_name.clone();
        self.allow_guest_login = identities.allow_guest_login;
        self
    }

    pub fn with_admin_names(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.admin_names = names.into_iter().collect();
        self
    }

    pub fn with_guest_login(mut self, allowed: bool) -> Self {
        self.allow_guest_login = allowed;
        self
    }

    pub fn encoder(&self) -> &CompositePasswordEncoder {
        &self.encoder
    }

    /// Default administrators are never disabled, locked or expired.
    fn is_admin(&self, user_name: &str) -> bool {
        self.admin_names.contains(user_name)
    }

    /// The guest and system identities never get stored accounts.
    fn is_reserved(&self, user_name: &str) -> bool {
        user_name.eq_ignore_ascii_case(&self.system_name)
            || self
                .guest_names
                .iter()
                .any(|name| user_name.eq_ignore_ascii_case(name))
    }

    fn check_account_status(&self, user: &UserRecord, now: DateTime<Utc>) -> AuthResult<()> {
        if self.is_admin(&user.user_name) {
            return Ok(());
        }
        if !user.enabled {
            return Err(AuthError::AccountDisabled);
        }
        if user.locked {
            return Err(AuthError::AccountLocked);
        }
        if user.account_expired(now) {
            return Err(AuthError::AccountExpired);
        }
        Ok(())
    }

    /// Re-encodes the stored hash with the preferred encoding. Failures are
    /// logged and otherwise ignored; the login has already succeeded.
    fn upgrade_password(&self, user_name: &str, password: &str) {
        let hashed = match self.encoder.encode(password) {
            Ok(hashed) => hashed,
            Err(e) => {
                tracing::warn!("Password upgrade failed for {}: {e}", mask_user_name(user_name));
                return;
            }
        };
        match self
            .store
            .update(user_name, &mut |user| user.password = hashed.clone())
        {
            Ok(()) => tracing::info!(
                "Password for {} re-encoded as {}",
                mask_user_name(user_name),
                self.encoder.preferred()
            ),
            Err(e) => {
                tracing::warn!("Password upgrade failed for {}: {e}", mask_user_name(user_name))
            }
        }
    }

    pub fn set_locked(&self, user_name: &str, locked: bool) -> AuthResult<()> {
        self.store.update(user_name, &mut |user| user.locked = locked)
    }

    pub fn set_account_expiry(
        &self,
        user_name: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> AuthResult<()> {
        self.store
            .update(user_name, &mut |user| user.account_expires_at = expires_at)
    }

    pub fn set_credentials_expiry(
        &self,
        user_name: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> AuthResult<()> {
        self.store
            .update(user_name, &mut |user| user.credentials_expire_at = expires_at)
    }
}

impl Authenticator for RepositoryAuthenticator {
    fn name(&self) -> &str {
        "repository"
    }

    fn check_credentials(&self, user_name: &str, password: &str) -> AuthResult<()> {
        let user = self
            .store
            .lookup(user_name)
            .ok_or(AuthError::AuthenticationFailed)?;
        let now = self.clock.now();

        self.check_account_status(&user, now)?;
        if !self.encoder.matches(&user.password, password)? {
            return Err(AuthError::AuthenticationFailed);
        }
        if !self.is_admin(user_name) && user.credentials_expired(now) {
            return Err(AuthError::CredentialsExpired);
        }

        if self.encoder.needs_upgrade(&user.password) {
            self.upgrade_password(user_name, password);
        }
        Ok(())
    }

    fn guest_login_allowed(&self) -> bool {
        self.allow_guest_login
    }

    fn default_administrator_names(&self) -> BTreeSet<String> {
        self.admin_names.clone()
    }

    fn default_guest_names(&self) -> BTreeSet<String> {
        self.guest_names.clone()
    }
}

impl MutableAuthenticator for RepositoryAuthenticator {
    fn create_user(&self, user_name: &str, password: &str) -> AuthResult<()> {
        if self.is_reserved(user_name) {
            return Err(AuthError::ReservedUserName(user_name.to_string()));
        }
        if self.store.user_exists(user_name) {
            return Err(AuthError::UserExists(user_name.to_string()));
        }
        let hashed = self.encoder.encode(password)?;
        self.store.create(UserRecord::new(user_name, hashed))?;
        tracing::info!("Created user {}", mask_user_name(user_name));
        Ok(())
    }

    fn set_password(&self, user_name: &str, password: &str) -> AuthResult<()> {
        if !self.store.user_exists(user_name) {
            return Err(AuthError::UserNotFound(user_name.to_string()));
        }
        let hashed = self.encoder.encode(password)?;
        self.store
            .update(user_name, &mut |user| user.password = hashed.clone())
    }

    fn delete_user(&self, user_name: &str) -> AuthResult<()> {
        self.store.delete(user_name)?;
        tracing::info!("Deleted user {}", mask_user_name(user_name));
        Ok(())
    }

    fn set_enabled(&self, user_name: &str, enabled: bool) -> AuthResult<()> {
        self.store.update(user_name, &mut |user| user.enabled = enabled)
    }

    fn is_enabled(&self, user_name: &str) -> bool {
        self.store.lookup(user_name).is_some_and(|user| user.enabled)
    }

    fn user_exists(&self, user_name: &str) -> bool {
        self.store.user_exists(user_name)
    }
}
