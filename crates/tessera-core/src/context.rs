//! Request-scoped identity.
//!
//! A [`RequestContext`] is created per inbound call and passed by `&mut` to
//! every operation that reads or changes who the caller is. Nothing about the
//! caller lives in process-wide or thread-local state.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

/// Authority level of an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A regular user authenticated through the chain or a ticket.
    User,
    /// The reserved, credential-free guest identity.
    Guest,
    /// Unrestricted identity for internal operations.
    System,
}

/// Who is authenticated on the current call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    user_name: String,
    role: Role,
}

impl Principal {
    pub fn new(user_name: impl Into<String>, role: Role) -> Self {
        Self {
            user_name: user_name.into(),
            role,
        }
    }

    pub fn user(user_name: impl Into<String>) -> Self {
        Self::new(user_name, Role::User)
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_guest(&self) -> bool {
        self.role == Role::Guest
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

/// Principal and ticket bound to one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    principal: Option<Principal>,
    ticket: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn user_name(&self) -> Option<&str> {
        self.principal.as_ref().map(Principal::user_name)
    }

    pub fn set_principal(&mut self, principal: Principal) {
        self.principal = Some(principal);
    }

    pub fn clear_principal(&mut self) {
        self.principal = None;
    }

    /// The ticket id bound by the last issue or validation on this request.
    pub fn ticket(&self) -> Option<&str> {
        self.ticket.as_deref()
    }

    pub fn set_ticket(&mut self, ticket_id: impl Into<String>) {
        self.ticket = Some(ticket_id.into());
    }

    pub fn clear_ticket(&mut self) {
        self.ticket = None;
    }

    /// Forgets both principal and ticket.
    pub fn clear(&mut self) {
        self.principal = None;
        self.ticket = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    /// Guards the context so that it is cleared unless [`ContextGuard::commit`]
    /// is reached.
    pub fn guard(&mut self) -> ContextGuard<'_> {
        ContextGuard {
            ctx: self,
            committed: false,
        }
    }
}

/// Clears the wrapped context on drop unless committed.
///
/// Every early return through `?` and every unwinding panic therefore leaves
/// the request without an identity.
#[derive(Debug)]
pub struct ContextGuard<'a> {
    ctx: &'a mut RequestContext,
    committed: bool,
}

impl ContextGuard<'_> {
    /// Keeps whatever the context holds now.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Deref for ContextGuard<'_> {
    type Target = RequestContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for ContextGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.ctx.clear();
        }
    }
}
