//! Session tickets: the data type, its storage, expiry policy and the engine
//! that ties them together.
//!
//! - [`store`]: the shared key → [`Ticket`] table ([`TicketStore`]).
//! - [`policy`]: pure expiry decisions ([`TicketPolicy`], [`ExpiryMode`]).
//! - [`component`]: issue/validate/invalidate ([`TicketComponent`]).

pub mod component;
pub mod policy;
pub mod store;

pub use component::TicketComponent;
pub use policy::{ExpiryMode, TicketPolicy};
pub use store::{InMemoryTicketStore, TicketStore};

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Literal prefix of every ticket id handed to callers.
pub const TICKET_PREFIX: &str = "TICKET_";

/// An issued session ticket.
///
/// Owned by exactly one user, referenced by name. Only the access and expiry
/// timestamps change after issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    key: String,
    user_name: String,
    expires: bool,
    expiry_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    last_access: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Creates a ticket. `valid_for` of `None` means the ticket never expires.
    pub fn new(
        key: impl Into<String>,
        user_name: impl Into<String>,
        created_at: DateTime<Utc>,
        valid_for: Option<TimeDelta>,
    ) -> Self {
        Self {
            key: key.into(),
            user_name: user_name.into(),
            expires: valid_for.is_some(),
            expiry_date: valid_for.map(|d| created_at.checked_add_signed(d).unwrap_or(DateTime::<Utc>::MAX_UTC)),
            created_at,
            last_access: None,
        }
    }

    /// Store key, without the [`TICKET_PREFIX`].
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The id handed to callers: [`TICKET_PREFIX`] followed by the key.
    pub fn ticket_id(&self) -> String {
        format!("{TICKET_PREFIX}{}", self.key)
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn expires(&self) -> bool {
        self.expires
    }

    pub fn expiry_date(&self) -> Option<DateTime<Utc>> {
        if self.expires {
            self.expiry_date
        } else {
            None
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last successful validation, falling back to the creation time.
    pub fn last_access(&self) -> DateTime<Utc> {
        self.last_access.unwrap_or(self.created_at)
    }

    /// Returns a copy accessed at `now`, with the expiry pushed to `now + valid_for`.
    pub(crate) fn touched(&self, now: DateTime<Utc>, valid_for: Option<TimeDelta>) -> Self {
        let mut ticket = self.clone();
        ticket.last_access = Some(now);
        if let (true, Some(d)) = (ticket.expires, valid_for) {
            ticket.expiry_date = Some(now.checked_add_signed(d).unwrap_or(DateTime::<Utc>::MAX_UTC));
        }
        ticket
    }
}

/// Strips [`TICKET_PREFIX`] if present. Bare keys are passed through unchanged.
pub fn ticket_key(ticket_id: &str) -> &str {
    ticket_id.strip_prefix(TICKET_PREFIX).unwrap_or(ticket_id)
}

/// Derives a fresh ticket key from the issue time, the owner and random material.
pub(crate) fn generate_key(user_name: &str, now: DateTime<Utc>) -> String {
    let nonce: u64 = rand::thread_rng().gen();
    let mut hasher = Sha256::new();
    hasher.update(now.timestamp_nanos_opt().unwrap_or_default().to_be_bytes());
    hasher.update(user_name.as_bytes());
    hasher.update(uuid::Uuid::new_v4().as_bytes());
    hasher.update(nonce.to_be_bytes());
    format!("{:x}", hasher.finalize())
}
