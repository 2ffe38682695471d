//! The authentication service: admission checks, login and ticket binding.
//!
//! Every operation that can fail takes the request context through a
//! [`ContextGuard`](crate::context::ContextGuard), so an error never leaves a
//! stale principal or ticket behind.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::chain::AuthenticatorChain;
use crate::clock::Clock;
use crate::component::AuthenticationComponent;
use crate::config::{AdmissionConfig, AuthConfig};
use crate::context::RequestContext;
use crate::error::{AuthError, AuthResult};
use crate::mask_user_name;
use crate::ticket::{ticket_key, TicketComponent, TicketStore};

pub struct AuthenticationService {
    component: AuthenticationComponent,
    tickets: TicketComponent,
    admission: AdmissionConfig,
}

impl AuthenticationService {
    pub fn new(
        component: AuthenticationComponent,
        tickets: TicketComponent,
        admission: AdmissionConfig,
    ) -> Self {
        Self {
            component,
            tickets,
            admission,
        }
    }

    pub fn from_config(
        config: &AuthConfig,
        chain: AuthenticatorChain,
        store: Arc<dyn TicketStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            AuthenticationComponent::new(chain, config.identities.clone()),
            TicketComponent::from_config(store, &config.ticket, clock),
            config.admission.clone(),
        )
    }

    pub fn component(&self) -> &AuthenticationComponent {
        &self.component
    }

    pub fn tickets(&self) -> &TicketComponent {
        &self.tickets
    }

    /// Logs `user_name` in and returns a fresh ticket bound to `ctx`.
    ///
    /// Admission checks run first and a rejected user never reaches the
    /// chain. Any ticket already bound to `ctx` is invalidated, so logging in
    /// again never hands back the previous ticket. In single-ticket-per-user
    /// mode the user's own live ticket is kept and returned instead.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AuthenticationDisallowed`] if the user is not on the allow-list.
    /// - [`AuthError::MaxUsersExceeded`] if the user limit is reached.
    /// - [`AuthError::AuthenticationFailed`] or [`AuthError::GuestNotSupported`] from the component.
    pub fn authenticate(
        &self,
        ctx: &mut RequestContext,
        user_name: &str,
        password: &str,
    ) -> AuthResult<String> {
        let mut guard = ctx.guard();
        let previous = guard.ticket().map(str::to_string);

        self.pre_authentication_check(user_name)?;
        self.component
            .authenticate(&mut guard, user_name, password)
            .inspect_err(|e| {
                tracing::warn!("Login failed for {}: {e}", mask_user_name(user_name))
            })?;

        let user_name = guard
            .user_name()
            .map(str::to_string)
            .ok_or(AuthError::NoCurrentUser)?;
        let ticket = self.replace_ticket(&mut guard, previous.as_deref(), &user_name)?;
        tracing::info!("User {} logged in", mask_user_name(&user_name));
        guard.commit();
        Ok(ticket)
    }

    /// Logs in as the guest identity and returns a ticket for it.
    pub fn authenticate_as_guest(&self, ctx: &mut RequestContext) -> AuthResult<String> {
        let mut guard = ctx.guard();
        let previous = guard.ticket().map(str::to_string);
        let guest = self.component.guest_user_name().to_string();

        self.pre_authentication_check(&guest)?;
        self.component.set_guest_user_as_current(&mut guard)?;
        let ticket = self.replace_ticket(&mut guard, previous.as_deref(), &guest)?;
        tracing::debug!("Guest logged in");
        guard.commit();
        Ok(ticket)
    }

    /// Validates `ticket_id` and binds its owner as the current principal.
    ///
    /// A ticket owned by the system user is refused with
    /// [`AuthError::AuthenticationFailed`].
    pub fn validate(&self, ctx: &mut RequestContext, ticket_id: &str) -> AuthResult<String> {
        let mut guard = ctx.guard();
        let user_name = self
            .tickets
            .validate_ticket(&mut guard, ticket_id)
            .inspect_err(|e| tracing::debug!("Ticket rejected: {e}"))?;
        self.component.set_current_user(&mut guard, &user_name)?;
        guard.commit();
        Ok(user_name)
    }

    /// The live ticket bound to `ctx`, or a new one if there is none.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NoCurrentUser`] if `ctx` has no principal.
    /// - [`AuthError::ReservedUserName`] for the system principal, which never gets a ticket.
    pub fn get_current_ticket(&self, ctx: &mut RequestContext) -> AuthResult<String> {
        let mut guard = ctx.guard();
        let principal = guard.principal().ok_or(AuthError::NoCurrentUser)?;
        if principal.is_system() {
            return Err(AuthError::ReservedUserName(principal.user_name().to_string()));
        }
        let user_name = principal.user_name().to_string();
        let ticket = self
            .tickets
            .get_current_ticket(&mut guard, &user_name, true)?
            .ok_or(AuthError::TicketNotFound)?;
        guard.commit();
        Ok(ticket)
    }

    /// Same as [`Self::get_current_ticket`]: a ticket is only minted when no
    /// live one is bound, so repeated calls within a session do not pile up
    /// tickets.
    pub fn get_new_ticket(&self, ctx: &mut RequestContext) -> AuthResult<String> {
        self.get_current_ticket(ctx)
    }

    /// Invalidates `ticket_id` and unbinds it from `ctx` if bound there.
    /// The principal stays.
    pub fn invalidate_ticket(&self, ctx: &mut RequestContext, ticket_id: &str) {
        self.tickets.invalidate_by_id(ticket_id);
        if ctx.ticket().map(ticket_key) == Some(ticket_key(ticket_id)) {
            ctx.clear_ticket();
        }
    }

    /// Invalidates every ticket of `user_name`. Returns how many were removed.
    pub fn invalidate_user_session(&self, user_name: &str) -> usize {
        self.tickets.invalidate_by_user(user_name)
    }

    pub fn get_current_user_name<'a>(&self, ctx: &'a RequestContext) -> Option<&'a str> {
        ctx.user_name()
    }

    pub fn clear_current_security_context(&self, ctx: &mut RequestContext) {
        self.component.clear_current_security_context(ctx);
    }

    pub fn set_system_user_as_current(&self, ctx: &mut RequestContext) {
        self.component.set_system_user_as_current(ctx);
    }

    pub fn guest_user_authentication_allowed(&self) -> bool {
        self.component.guest_user_authentication_allowed()
    }

    pub fn default_administrator_names(&self) -> BTreeSet<String> {
        self.component.default_administrator_names()
    }

    pub fn is_admin(&self, user_name: &str) -> bool {
        self.component.is_admin(user_name)
    }

    pub fn users_with_tickets(&self, non_expired_only: bool) -> BTreeSet<String> {
        self.tickets.users_with_tickets(non_expired_only)
    }

    pub fn count_tickets(&self, non_expired_only: bool) -> usize {
        self.tickets.count_tickets(non_expired_only)
    }

    pub fn invalidate_tickets(&self, expired_only: bool) -> usize {
        self.tickets.invalidate_tickets(expired_only)
    }

    pub fn invalidate_expired_tickets(&self) -> usize {
        self.invalidate_tickets(true)
    }

    pub fn create_authentication(&self, user_name: &str, password: &str) -> AuthResult<()> {
        self.component.mutable()?.create_user(user_name, password)
    }

    /// Changes a password after checking the old one. Existing sessions end.
    pub fn update_authentication(
        &self,
        user_name: &str,
        old_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        let mutable = self.component.mutable()?;
        mutable.check_credentials(user_name, old_password)?;
        mutable.set_password(user_name, new_password)?;
        self.invalidate_user_session(user_name);
        Ok(())
    }

    /// Sets a password without checking the old one. Existing sessions end.
    pub fn set_authentication(&self, user_name: &str, password: &str) -> AuthResult<()> {
        self.component.mutable()?.set_password(user_name, password)?;
        self.invalidate_user_session(user_name);
        Ok(())
    }

    pub fn delete_authentication(&self, user_name: &str) -> AuthResult<()> {
        self.component.mutable()?.delete_user(user_name)?;
        self.invalidate_user_session(user_name);
        Ok(())
    }

    /// Disabling an account also ends its sessions.
    pub fn set_authentication_enabled(&self, user_name: &str, enabled: bool) -> AuthResult<()> {
        self.component.mutable()?.set_enabled(user_name, enabled)?;
        if !enabled {
            self.invalidate_user_session(user_name);
        }
        Ok(())
    }

    pub fn authentication_enabled(&self, user_name: &str) -> AuthResult<bool> {
        Ok(self.component.mutable()?.is_enabled(user_name))
    }

    pub fn authentication_exists(&self, user_name: &str) -> AuthResult<bool> {
        Ok(self.component.mutable()?.user_exists(user_name))
    }

    /// Allow-list and user-limit checks. Any spelling of the guest name is
    /// checked as the configured guest name.
    fn pre_authentication_check(&self, user_name: &str) -> AuthResult<()> {
        let is_guest = self.component.is_guest_user_name(user_name);
        let canonical = if is_guest {
            self.component.guest_user_name()
        } else {
            user_name
        };

        if let Some(allowed) = &self.admission.allowed_users {
            let listed = allowed
                .iter()
                .any(|name| name == canonical || (is_guest && self.component.is_guest_user_name(name)));
            if !listed {
                tracing::warn!(
                    "Login disallowed for {}: not on the allow-list",
                    mask_user_name(user_name)
                );
                return Err(AuthError::AuthenticationDisallowed(user_name.to_string()));
            }
        }

        if let Some(max) = self.admission.max_users_limit() {
            let active = self.tickets.users_with_tickets(true);
            if active.len() >= max && !active.contains(canonical) {
                tracing::warn!(
                    "Login disallowed for {}: {} of {max} users active",
                    mask_user_name(user_name),
                    active.len()
                );
                return Err(AuthError::MaxUsersExceeded { max });
            }
        }
        Ok(())
    }

    /// Drops `previous` unless single-ticket mode lets the same user keep it,
    /// then binds a ticket for `user_name`.
    fn replace_ticket(
        &self,
        ctx: &mut RequestContext,
        previous: Option<&str>,
        user_name: &str,
    ) -> AuthResult<String> {
        if let Some(previous) = previous {
            let keep = self.tickets.uses_single_ticket_per_user()
                && self.tickets.get_authority_for_ticket(previous).ok().as_deref()
                    == Some(user_name);
            if !keep {
                self.tickets.invalidate_by_id(previous);
            }
        }
        ctx.clear_ticket();
        self.tickets.issue_ticket(ctx, user_name)
    }
}
