//! Tessera core library: ticket-based session authentication.
//!
//! `tessera-core` issues opaque session tickets, validates and expires them,
//! and authenticates users through an ordered chain of pluggable back ends.
//! It has no transport of its own; `tessera-web` puts HTTP in front of it.
//!
//! # Modules
//!
//! - [`ticket`] — Tickets, the shared [`TicketStore`], expiry [`TicketPolicy`] and the [`TicketComponent`] engine.
//! - [`chain`] — The [`Authenticator`] trait and the ordered [`AuthenticatorChain`].
//! - [`component`] — [`AuthenticationComponent`]: guest/system special cases in front of the chain.
//! - [`service`] — [`AuthenticationService`]: admission checks, login and ticket binding.
//! - [`repository`] — [`RepositoryAuthenticator`], the account-store back end that can create and update users.
//! - [`users`] — User records and the [`InMemoryUserStore`].
//! - [`password`] — Password hashing with lazy upgrade ([`CompositePasswordEncoder`]).
//! - [`context`] — Request-scoped identity ([`RequestContext`]).
//! - [`config`] — TOML configuration ([`AuthConfig`]).
//! - [`clock`] — Time sources.
//! - [`error`] — Unified error type ([`AuthError`]) and result alias ([`AuthResult`]).

pub mod chain;
pub mod clock;
pub mod component;
pub mod config;
pub mod context;
pub mod error;
pub mod password;
pub mod repository;
pub mod service;
pub mod ticket;
pub mod users;

pub use chain::{Authenticator, AuthenticatorChain, MutableAuthenticator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use component::AuthenticationComponent;
pub use config::{AdmissionConfig, AuthConfig, IdentityConfig, PasswordConfig, TicketConfig};
pub use context::{ContextGuard, Principal, RequestContext, Role};
pub use error::{AuthError, AuthResult};
pub use password::{CompositePasswordEncoder, Encoding, HashedPassword};
pub use repository::RepositoryAuthenticator;
pub use service::AuthenticationService;
pub use ticket::{
    ticket_key, ExpiryMode, InMemoryTicketStore, Ticket, TicketComponent, TicketPolicy,
    TicketStore, TICKET_PREFIX,
};
pub use users::{InMemoryUserStore, UserAccountStore, UserRecord, UserRecordLookup};

/// Masks a user name for log output, keeping only its first two characters.
pub fn mask_user_name(user_name: &str) -> String {
    let visible: String = user_name.chars().take(2).collect();
    let hidden = user_name.chars().count().saturating_sub(2);
    format!("{visible}{}", "*".repeat(hidden))
}
