//! Ordered chain of pluggable authenticators.
//!
//! Credential checks stop at the first member that accepts. Guest support and
//! the default admin/guest names are aggregated over every member instead.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{AuthError, AuthResult};
use crate::mask_user_name;

/// A credential back end.
pub trait Authenticator: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// Succeeds if `password` is correct for `user_name` and the account may log in.
    fn check_credentials(&self, user_name: &str, password: &str) -> AuthResult<()>;

    fn guest_login_allowed(&self) -> bool {
        false
    }

    fn default_administrator_names(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    fn default_guest_names(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// An authenticator that can also maintain accounts.
pub trait MutableAuthenticator: Authenticator {
    fn create_user(&self, user_name: &str, password: &str) -> AuthResult<()>;

    /// Replaces the password without checking the old one.
    fn set_password(&self, user_name: &str, password: &str) -> AuthResult<()>;

    fn delete_user(&self, user_name: &str) -> AuthResult<()>;

    fn set_enabled(&self, user_name: &str, enabled: bool) -> AuthResult<()>;

    fn is_enabled(&self, user_name: &str) -> bool;

    fn user_exists(&self, user_name: &str) -> bool;
}

/// The distinguished mutable member, kept under both trait objects.
struct MutableEntry {
    authenticator: Arc<dyn Authenticator>,
    mutable: Arc<dyn MutableAuthenticator>,
}

/// A fixed, ordered sequence of authenticators.
///
/// The mutable member, if any, is always tried first.
#[derive(Default)]
pub struct AuthenticatorChain {
    mutable: Option<MutableEntry>,
    members: Vec<Arc<dyn Authenticator>>,
}

impl AuthenticatorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the mutable member, replacing any previous one.
    pub fn with_mutable<A>(mut self, authenticator: Arc<A>) -> Self
    where
        A: MutableAuthenticator + 'static,
    {
        self.mutable = Some(MutableEntry {
            authenticator: authenticator.clone(),
            mutable: authenticator,
        });
        self
    }

    /// Appends a read-only member.
    pub fn with(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.members.push(authenticator);
        self
    }

    pub fn mutable(&self) -> Option<&Arc<dyn MutableAuthenticator>> {
        self.mutable.as_ref().map(|entry| &entry.mutable)
    }

    pub fn len(&self) -> usize {
        self.members.len() + usize::from(self.mutable.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Members in the order they are tried.
    pub fn members(&self) -> impl Iterator<Item = &Arc<dyn Authenticator>> {
        self.mutable
            .iter()
            .map(|entry| &entry.authenticator)
            .chain(self.members.iter())
    }

    /// Tries each member in order until one accepts.
    ///
    /// # Errors
    ///
    /// [`AuthError::AuthenticationFailed`] once every member has rejected. The
    /// members' own reasons are not passed on.
    pub fn authenticate(&self, user_name: &str, password: &str) -> AuthResult<()> {
        for member in self.members() {
            match member.check_credentials(user_name, password) {
                Ok(()) => {
                    tracing::debug!(
                        "User {} accepted by {}",
                        mask_user_name(user_name),
                        member.name()
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(
                        "User {} rejected by {}: {e}",
                        mask_user_name(user_name),
                        member.name()
                    );
                }
            }
        }
        Err(AuthError::AuthenticationFailed)
    }

    /// True if any member allows guest login.
    pub fn guest_login_allowed(&self) -> bool {
        self.members().any(|member| member.guest_login_allowed())
    }

    pub fn default_administrator_names(&self) -> BTreeSet<String> {
        self.members()
            .flat_map(|member| member.default_administrator_names())
            .collect()
    }

    pub fn default_guest_names(&self) -> BTreeSet<String> {
        self.members()
            .flat_map(|member| member.default_guest_names())
            .collect()
    }
}
