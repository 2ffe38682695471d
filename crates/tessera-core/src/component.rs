//! Guest and system identities in front of the authenticator chain.

use std::collections::BTreeSet;

use crate::chain::{AuthenticatorChain, MutableAuthenticator};
use crate::config::IdentityConfig;
use crate::context::{Principal, RequestContext, Role};
use crate::error::{AuthError, AuthResult};
use crate::mask_user_name;

/// Authenticates against the chain and binds the resulting principal.
pub struct AuthenticationComponent {
    chain: AuthenticatorChain,
    identities: IdentityConfig,
}

impl AuthenticationComponent {
    pub fn new(chain: AuthenticatorChain, identities: IdentityConfig) -> Self {
        Self { chain, identities }
    }

    pub fn chain(&self) -> &AuthenticatorChain {
        &self.chain
    }

    /// The chain's mutable member, used for account maintenance.
    pub fn mutable(&self) -> AuthResult<&dyn MutableAuthenticator> {
        self.chain
            .mutable()
            .map(|member| &**member)
            .ok_or(AuthError::ImmutableChain)
    }

    /// Checks the credentials and binds the principal to `ctx`.
    ///
    /// The guest name is matched case-insensitively and needs no password.
    /// The system name gets no special treatment here; it is only reachable
    /// through [`Self::set_system_user_as_current`].
    ///
    /// # Errors
    ///
    /// - [`AuthError::GuestNotSupported`] for the guest name when no member allows guests.
    /// - [`AuthError::AuthenticationFailed`] when the chain rejects the credentials.
    ///
    /// `ctx` is cleared on every error.
    pub fn authenticate(
        &self,
        ctx: &mut RequestContext,
        user_name: &str,
        password: &str,
    ) -> AuthResult<()> {
        let mut guard = ctx.guard();
        if self.is_guest_user_name(user_name) {
            self.set_guest_user_as_current(&mut guard)?;
        } else {
            self.chain.authenticate(user_name, password)?;
            guard.set_principal(Principal::user(user_name));
        }
        guard.commit();
        Ok(())
    }

    pub fn set_system_user_as_current(&self, ctx: &mut RequestContext) {
        tracing::debug!("Running as system user");
        ctx.set_principal(Principal::new(&self.identities.system_user_name, Role::System));
    }

    pub fn set_guest_user_as_current(&self, ctx: &mut RequestContext) -> AuthResult<()> {
        if !self.guest_user_authentication_allowed() {
            ctx.clear();
            return Err(AuthError::GuestNotSupported);
        }
        ctx.set_principal(Principal::new(&self.identities.guest_user_name, Role::Guest));
        Ok(())
    }

    /// Binds `user_name` without checking credentials, as a guest or a plain
    /// user depending on the name.
    ///
    /// # Errors
    ///
    /// [`AuthError::AuthenticationFailed`] for the system user name, in any
    /// case. `ctx` is cleared.
    pub fn set_current_user(&self, ctx: &mut RequestContext, user_name: &str) -> AuthResult<()> {
        if user_name.eq_ignore_ascii_case(&self.identities.system_user_name) {
            tracing::warn!("Refused to bind the system user from a ticket");
            ctx.clear();
            return Err(AuthError::AuthenticationFailed);
        }
        let role = if self.is_guest_user_name(user_name) {
            Role::Guest
        } else {
            Role::User
        };
        tracing::trace!("Current user set to {}", mask_user_name(user_name));
        ctx.set_principal(Principal::new(user_name, role));
        Ok(())
    }

    pub fn clear_current_security_context(&self, ctx: &mut RequestContext) {
        ctx.clear();
    }

    pub fn guest_user_authentication_allowed(&self) -> bool {
        self.chain.guest_login_allowed()
    }

    pub fn default_administrator_names(&self) -> BTreeSet<String> {
        let mut names = self.chain.default_administrator_names();
        names.extend(self.identities.admin_user_names.iter().cloned());
        names
    }

    pub fn is_admin(&self, user_name: &str) -> bool {
        self.default_administrator_names().contains(user_name)
    }

    pub fn is_guest_user_name(&self, user_name: &str) -> bool {
        let wanted = user_name.to_lowercase();
        wanted == self.identities.guest_user_name.to_lowercase()
            || self
                .chain
                .default_guest_names()
                .iter()
                .any(|name| name.to_lowercase() == wanted)
    }

    pub fn is_system_user_name(&self, user_name: &str) -> bool {
        user_name == self.identities.system_user_name
    }

    pub fn guest_user_name(&self) -> &str {
        &self.identities.guest_user_name
    }

    pub fn system_user_name(&self) -> &str {
        &self.identities.system_user_name
    }
}
