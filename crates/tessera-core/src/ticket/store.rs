//! Shared ticket table.
//!
//! The engine only assumes single-key atomicity and read-your-writes. Scans
//! over [`TicketStore::keys`] are best effort: a ticket put or removed while a
//! scan runs may or may not be seen by it.

use dashmap::DashMap;

use super::Ticket;

/// Key → [`Ticket`] mapping shared by every request thread.
///
/// Clustered deployments implement this over their distributed cache; the
/// in-process [`InMemoryTicketStore`] is the reference implementation.
pub trait TicketStore: Send + Sync {
    /// Inserts or overwrites. Callers guarantee the key is fresh.
    fn put(&self, ticket: Ticket);

    fn get(&self, key: &str) -> Option<Ticket>;

    /// Overwrites the ticket only if its key is still present, so a refresh
    /// racing with an invalidation cannot bring the ticket back.
    fn replace(&self, ticket: Ticket) -> bool;

    /// Removes and returns the ticket. Of several concurrent callers at most one
    /// receives it.
    fn take(&self, key: &str) -> Option<Ticket>;

    /// Removes the ticket if present.
    fn remove(&self, key: &str) {
        self.take(key);
    }

    /// Snapshot of the keys currently stored.
    fn keys(&self) -> Vec<String>;

    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The key recorded for `user_name` in single-ticket-per-user mode.
    fn user_ticket(&self, user_name: &str) -> Option<String>;

    fn set_user_ticket(&self, user_name: &str, key: &str);

    fn clear_user_ticket(&self, user_name: &str);

    /// Drops every ticket and user index entry.
    fn clear(&self);
}

/// Single-process ticket store on sharded concurrent maps.
#[derive(Debug, Default)]
pub struct InMemoryTicketStore {
    tickets: DashMap<String, Ticket>,
    user_index: DashMap<String, String>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TicketStore for InMemoryTicketStore {
    fn put(&self, ticket: Ticket) {
        tracing::trace!("Ticket stored: key={}", ticket.key());
        self.tickets.insert(ticket.key().to_string(), ticket);
    }

    fn get(&self, key: &str) -> Option<Ticket> {
        self.tickets.get(key).map(|entry| entry.clone())
    }

    fn replace(&self, ticket: Ticket) -> bool {
        match self.tickets.get_mut(ticket.key()) {
            Some(mut entry) => {
                *entry = ticket;
                true
            }
            None => false,
        }
    }

    fn take(&self, key: &str) -> Option<Ticket> {
        self.tickets.remove(key).map(|(_, ticket)| ticket)
    }

    fn keys(&self) -> Vec<String> {
        self.tickets.iter().map(|entry| entry.key().clone()).collect()
    }

    fn len(&self) -> usize {
        self.tickets.len()
    }

    fn user_ticket(&self, user_name: &str) -> Option<String> {
        self.user_index.get(user_name).map(|entry| entry.clone())
    }

    fn set_user_ticket(&self, user_name: &str, key: &str) {
        self.user_index.insert(user_name.to_string(), key.to_string());
    }

    fn clear_user_ticket(&self, user_name: &str) {
        self.user_index.remove(user_name);
    }

    fn clear(&self) {
        self.tickets.clear();
        self.user_index.clear();
    }
}
