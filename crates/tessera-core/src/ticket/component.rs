//! The ticket engine.
//!
//! Per ticket: `ISSUED → (VALID)* → EXPIRED | INVALIDATED`. Validation either
//! keeps a ticket valid, consumes it (one-off), or evicts it as expired.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::TicketConfig;
use crate::context::RequestContext;
use crate::error::{AuthError, AuthResult};
use crate::mask_user_name;

use super::policy::TicketPolicy;
use super::store::TicketStore;
use super::{generate_key, ticket_key, Ticket};

/// Issues, validates and invalidates session tickets.
pub struct TicketComponent {
    store: Arc<dyn TicketStore>,
    policy: TicketPolicy,
    clock: Arc<dyn Clock>,
    single_ticket_per_user: bool,
}

impl TicketComponent {
    pub fn new(store: Arc<dyn TicketStore>, policy: TicketPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            policy,
            clock,
            single_ticket_per_user: false,
        }
    }

    pub fn from_config(
        store: Arc<dyn TicketStore>,
        config: &TicketConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(store, TicketPolicy::from_config(config), clock)
            .with_single_ticket_per_user(config.use_single_ticket_per_user)
    }

    /// When enabled, issuing for a user who already holds a live ticket returns
    /// that ticket instead of minting another.
    pub fn with_single_ticket_per_user(mut self, enabled: bool) -> Self {
        self.single_ticket_per_user = enabled;
        self
    }

    pub fn policy(&self) -> &TicketPolicy {
        &self.policy
    }

    pub fn uses_single_ticket_per_user(&self) -> bool {
        self.single_ticket_per_user
    }

    /// Issues a ticket for `user_name` and binds it to `ctx`.
    ///
    /// # Errors
    ///
    /// [`AuthError::TicketCollision`] if the generated key is already stored.
    /// This is an invariant violation and is never retried.
    pub fn issue_ticket(&self, ctx: &mut RequestContext, user_name: &str) -> AuthResult<String> {
        let now = self.clock.now();

        if self.single_ticket_per_user {
            if let Some(existing) = self.live_user_ticket(user_name) {
                tracing::debug!(
                    "Reusing ticket for user {}",
                    mask_user_name(user_name)
                );
                let ticket_id = existing.ticket_id();
                ctx.set_ticket(ticket_id.clone());
                return Ok(ticket_id);
            }
        }

        let key = generate_key(user_name, now);
        if self.store.get(&key).is_some() {
            tracing::error!("Generated ticket key already in use");
            return Err(AuthError::TicketCollision);
        }

        let ticket = Ticket::new(key, user_name, now, self.policy.lifetime());
        let ticket_id = ticket.ticket_id();
        if self.single_ticket_per_user {
            self.store.set_user_ticket(user_name, ticket.key());
        }
        self.store.put(ticket);

        tracing::debug!("Ticket issued for user {}", mask_user_name(user_name));
        ctx.set_ticket(ticket_id.clone());
        Ok(ticket_id)
    }

    /// Validates `ticket_id` and returns its owner.
    ///
    /// Expired tickets are evicted. One-off tickets are consumed and not bound
    /// to `ctx`; other tickets are bound and, in sliding mode, refreshed.
    ///
    /// # Errors
    ///
    /// - [`AuthError::TicketNotFound`] if the ticket is absent or was consumed.
    /// - [`AuthError::TicketExpired`] if the policy rejects its age.
    pub fn validate_ticket(&self, ctx: &mut RequestContext, ticket_id: &str) -> AuthResult<String> {
        let key = ticket_key(ticket_id);
        let now = self.clock.now();
        let ticket = self.store.get(key).ok_or(AuthError::TicketNotFound)?;

        if self.policy.has_expired(&ticket, now) {
            tracing::debug!("Ticket expired for user {}", mask_user_name(ticket.user_name()));
            self.evict(&ticket);
            return Err(AuthError::TicketExpired);
        }

        if self.policy.should_consume_on_use() {
            let consumed = self.store.take(key).ok_or(AuthError::TicketNotFound)?;
            self.unindex(&consumed);
            if ctx.ticket().map(ticket_key) == Some(key) {
                ctx.clear_ticket();
            }
            return Ok(consumed.user_name().to_string());
        }

        if let Some(refreshed) = self.policy.refresh(&ticket, now) {
            if !self.store.replace(refreshed) {
                return Err(AuthError::TicketNotFound);
            }
        }

        ctx.set_ticket(ticket.ticket_id());
        Ok(ticket.user_name().to_string())
    }

    /// Owner of `ticket_id` without refreshing, consuming or binding it.
    pub fn get_authority_for_ticket(&self, ticket_id: &str) -> AuthResult<String> {
        let ticket = self
            .store
            .get(ticket_key(ticket_id))
            .ok_or(AuthError::TicketNotFound)?;
        if self.policy.has_expired(&ticket, self.clock.now()) {
            return Err(AuthError::TicketExpired);
        }
        Ok(ticket.user_name().to_string())
    }

    /// Removes the ticket. Unknown ids are ignored.
    pub fn invalidate_by_id(&self, ticket_id: &str) {
        if let Some(ticket) = self.store.take(ticket_key(ticket_id)) {
            self.unindex(&ticket);
            tracing::debug!("Ticket invalidated for user {}", mask_user_name(ticket.user_name()));
        }
    }

    /// Removes every ticket owned by `user_name` and returns how many went.
    ///
    /// A full scan, not atomic with respect to tickets issued while it runs.
    pub fn invalidate_by_user(&self, user_name: &str) -> usize {
        let mut removed = 0;
        for ticket in self.scan() {
            if ticket.user_name() == user_name && self.store.take(ticket.key()).is_some() {
                removed += 1;
            }
        }
        self.store.clear_user_ticket(user_name);
        tracing::info!(
            "Invalidated {removed} ticket(s) for user {}",
            mask_user_name(user_name)
        );
        removed
    }

    /// The ticket bound to `ctx` if it is live and owned by `user_name`;
    /// otherwise a new one when `auto_create` is set.
    pub fn get_current_ticket(
        &self,
        ctx: &mut RequestContext,
        user_name: &str,
        auto_create: bool,
    ) -> AuthResult<Option<String>> {
        if let Some(bound) = ctx.ticket() {
            if let Some(ticket) = self.store.get(ticket_key(bound)) {
                if ticket.user_name() == user_name
                    && !self.policy.has_expired(&ticket, self.clock.now())
                {
                    return Ok(Some(bound.to_string()));
                }
            }
        }
        if auto_create {
            self.issue_ticket(ctx, user_name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Unbinds the ticket from `ctx` without invalidating it.
    pub fn clear_current_ticket(&self, ctx: &mut RequestContext) {
        ctx.clear_ticket();
    }

    pub fn count_tickets(&self, non_expired_only: bool) -> usize {
        if !non_expired_only {
            return self.store.len();
        }
        let now = self.clock.now();
        self.scan()
            .filter(|ticket| !self.policy.has_expired(ticket, now))
            .count()
    }

    pub fn users_with_tickets(&self, non_expired_only: bool) -> BTreeSet<String> {
        let now = self.clock.now();
        self.scan()
            .filter(|ticket| !non_expired_only || !self.policy.has_expired(ticket, now))
            .map(|ticket| ticket.user_name().to_string())
            .collect()
    }

    /// Removes expired tickets, or all tickets when `expired_only` is false.
    /// Returns the number removed.
    pub fn invalidate_tickets(&self, expired_only: bool) -> usize {
        let now = self.clock.now();
        let mut removed = 0;
        for ticket in self.scan() {
            if expired_only && !self.policy.has_expired(&ticket, now) {
                continue;
            }
            if let Some(ticket) = self.store.take(ticket.key()) {
                self.unindex(&ticket);
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!("Removed {removed} ticket(s) (expired_only={expired_only})");
        }
        removed
    }

    /// Tickets present at scan time. Keys removed mid-scan are skipped.
    fn scan(&self) -> impl Iterator<Item = Ticket> + '_ {
        self.store
            .keys()
            .into_iter()
            .filter_map(|key| self.store.get(&key))
    }

    fn live_user_ticket(&self, user_name: &str) -> Option<Ticket> {
        let key = self.store.user_ticket(user_name)?;
        match self.store.get(&key) {
            Some(ticket)
                if ticket.user_name() == user_name
                    && !self.policy.has_expired(&ticket, self.clock.now()) =>
            {
                Some(ticket)
            }
            _ => {
                self.store.clear_user_ticket(user_name);
                None
            }
        }
    }

    fn evict(&self, ticket: &Ticket) {
        self.store.remove(ticket.key());
        self.unindex(ticket);
    }

    fn unindex(&self, ticket: &Ticket) {
        if self.single_ticket_per_user
            && self.store.user_ticket(ticket.user_name()).as_deref() == Some(ticket.key())
        {
            self.store.clear_user_ticket(ticket.user_name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ticket::policy::ExpiryMode;
    use crate::ticket::store::InMemoryTicketStore;
    use std::collections::HashSet;
    use std::time::Duration;

    struct Fixture {
        store: Arc<InMemoryTicketStore>,
        clock: Arc<ManualClock>,
        tickets: TicketComponent,
    }

    fn fixture(policy: TicketPolicy) -> Fixture {
        let store = Arc::new(InMemoryTicketStore::new());
        let clock = Arc::new(ManualClock::default());
        let tickets = TicketComponent::new(store.clone(), policy, clock.clone());
        Fixture {
            store,
            clock,
            tickets,
        }
    }

    fn never() -> Fixture {
        fixture(TicketPolicy::never_expires())
    }

    #[test]
    fn issue_binds_and_stores() {
        let f = never();
        let mut ctx = RequestContext::new();

        let id = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();
        assert!(id.starts_with("TICKET_"));
        assert_eq!(ctx.ticket(), Some(id.as_str()));
        assert_eq!(f.store.len(), 1);
        assert_eq!(f.store.get(ticket_key(&id)).unwrap().user_name(), "andy");
    }

    #[test]
    fn issued_ids_are_unique() {
        let f = never();
        let mut ctx = RequestContext::new();
        let ids: HashSet<String> = (0..1000)
            .map(|_| f.tickets.issue_ticket(&mut ctx, "andy").unwrap())
            .collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn issued_ids_are_unique_across_threads() {
        let f = never();
        let ids: Vec<String> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    s.spawn(|| {
                        let mut ctx = RequestContext::new();
                        (0..250)
                            .map(|_| f.tickets.issue_ticket(&mut ctx, "andy").unwrap())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), 1000);
    }

    #[test]
    fn validate_returns_owner_and_binds() {
        let f = never();
        let mut issuer = RequestContext::new();
        let id = f.tickets.issue_ticket(&mut issuer, "andy").unwrap();

        let mut ctx = RequestContext::new();
        assert_eq!(f.tickets.validate_ticket(&mut ctx, &id).unwrap(), "andy");
        assert_eq!(ctx.ticket(), Some(id.as_str()));
    }

    #[test]
    fn validate_accepts_bare_key() {
        let f = never();
        let mut ctx = RequestContext::new();
        let id = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();

        assert_eq!(
            f.tickets.validate_ticket(&mut ctx, ticket_key(&id)).unwrap(),
            "andy"
        );
    }

    #[test]
    fn validate_unknown_ticket() {
        let f = never();
        let mut ctx = RequestContext::new();
        let err = f.tickets.validate_ticket(&mut ctx, "INVALID").unwrap_err();
        assert!(matches!(err, AuthError::TicketNotFound));
    }

    #[test]
    fn repeated_validation_keeps_ticket() {
        let f = never();
        let mut ctx = RequestContext::new();
        let id = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();

        for _ in 0..3 {
            f.tickets.validate_ticket(&mut ctx, &id).unwrap();
            assert_eq!(
                f.tickets.get_current_ticket(&mut ctx, "andy", true).unwrap(),
                Some(id.clone())
            );
        }
    }

    #[test]
    fn one_off_ticket_validates_once() {
        let f = fixture(TicketPolicy::new(ExpiryMode::Never, Duration::ZERO, true));
        let mut ctx = RequestContext::new();
        let id = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();

        assert_eq!(f.tickets.validate_ticket(&mut ctx, &id).unwrap(), "andy");
        let current = f.tickets.get_current_ticket(&mut ctx, "andy", true).unwrap();
        assert_ne!(current, Some(id.clone()));

        let err = f.tickets.validate_ticket(&mut ctx, &id).unwrap_err();
        assert!(matches!(err, AuthError::TicketNotFound));
    }

    #[test]
    fn one_off_race_has_exactly_one_winner() {
        let f = fixture(TicketPolicy::new(ExpiryMode::Never, Duration::ZERO, true));
        let id = f
            .tickets
            .issue_ticket(&mut RequestContext::new(), "andy")
            .unwrap();

        let results: Vec<AuthResult<String>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        let mut ctx = RequestContext::new();
                        f.tickets.validate_ticket(&mut ctx, &id)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, AuthError::TicketNotFound)));
    }

    #[test]
    fn fixed_time_expiry() {
        let f = fixture(TicketPolicy::new(
            ExpiryMode::AfterFixedTime,
            Duration::from_secs(5),
            false,
        ));
        let mut ctx = RequestContext::new();
        let id = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();

        for _ in 0..3 {
            f.clock.advance(Duration::from_secs(1));
            assert_eq!(f.tickets.validate_ticket(&mut ctx, &id).unwrap(), "andy");
        }

        f.clock.advance(Duration::from_secs(10));
        let err = f.tickets.validate_ticket(&mut ctx, &id).unwrap_err();
        assert!(matches!(err, AuthError::TicketExpired));
        assert!(f.store.is_empty());

        // stays dead
        for _ in 0..3 {
            assert!(f.tickets.validate_ticket(&mut ctx, &id).is_err());
        }
        f.clock.advance(Duration::from_secs(10));
        assert!(f.tickets.validate_ticket(&mut ctx, &id).is_err());
    }

    #[test]
    fn fixed_time_validation_does_not_extend() {
        let f = fixture(TicketPolicy::new(
            ExpiryMode::AfterFixedTime,
            Duration::from_secs(5),
            false,
        ));
        let mut ctx = RequestContext::new();
        let id = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();

        f.clock.advance(Duration::from_secs(4));
        f.tickets.validate_ticket(&mut ctx, &id).unwrap();
        f.clock.advance(Duration::from_secs(2));
        assert!(matches!(
            f.tickets.validate_ticket(&mut ctx, &id),
            Err(AuthError::TicketExpired)
        ));
    }

    #[test]
    fn zero_duration_expires_after_issue() {
        let f = fixture(TicketPolicy::new(ExpiryMode::AfterFixedTime, Duration::ZERO, false));
        let mut ctx = RequestContext::new();
        let id = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();

        f.clock.advance(Duration::from_millis(1));
        assert!(matches!(
            f.tickets.validate_ticket(&mut ctx, &id),
            Err(AuthError::TicketExpired)
        ));
    }

    #[test]
    fn inactivity_expiry_slides() {
        let f = fixture(TicketPolicy::new(
            ExpiryMode::AfterInactivity,
            Duration::from_secs(5),
            false,
        ));
        let mut ctx = RequestContext::new();
        let id = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();

        for _ in 0..50 {
            f.clock.advance(Duration::from_secs(4));
            f.tickets.validate_ticket(&mut ctx, &id).unwrap();
        }

        f.clock.advance(Duration::from_secs(6));
        assert!(matches!(
            f.tickets.validate_ticket(&mut ctx, &id),
            Err(AuthError::TicketExpired)
        ));
    }

    #[test]
    fn owner_lookup_does_not_refresh() {
        let f = fixture(TicketPolicy::new(
            ExpiryMode::AfterInactivity,
            Duration::from_secs(5),
            false,
        ));
        let id = f
            .tickets
            .issue_ticket(&mut RequestContext::new(), "andy")
            .unwrap();

        f.clock.advance(Duration::from_secs(4));
        assert_eq!(f.tickets.get_authority_for_ticket(&id).unwrap(), "andy");
        f.clock.advance(Duration::from_secs(4));
        assert!(matches!(
            f.tickets.get_authority_for_ticket(&id),
            Err(AuthError::TicketExpired)
        ));
    }

    #[test]
    fn invalidate_by_id() {
        let f = never();
        let mut ctx = RequestContext::new();
        let id = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();

        f.tickets.invalidate_by_id(&id);
        f.tickets.invalidate_by_id(&id);
        f.tickets.invalidate_by_id("TICKET_unknown");
        assert!(matches!(
            f.tickets.validate_ticket(&mut ctx, &id),
            Err(AuthError::TicketNotFound)
        ));
    }

    #[test]
    fn invalidate_by_user_spares_others() {
        let f = never();
        let mut ctx = RequestContext::new();
        let andy1 = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();
        let andy2 = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();
        let bob = f.tickets.issue_ticket(&mut ctx, "bob").unwrap();

        assert_eq!(f.tickets.invalidate_by_user("andy"), 2);

        for id in [&andy1, &andy2] {
            assert!(matches!(
                f.tickets.validate_ticket(&mut ctx, id),
                Err(AuthError::TicketNotFound)
            ));
        }
        assert_eq!(f.tickets.validate_ticket(&mut ctx, &bob).unwrap(), "bob");
    }

    #[test]
    fn current_ticket_without_auto_create() {
        let f = never();
        let mut ctx = RequestContext::new();
        assert_eq!(f.tickets.get_current_ticket(&mut ctx, "andy", false).unwrap(), None);

        let id = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();
        assert_eq!(
            f.tickets.get_current_ticket(&mut ctx, "andy", false).unwrap(),
            Some(id)
        );
    }

    #[test]
    fn current_ticket_of_other_user_is_not_reused() {
        let f = never();
        let mut ctx = RequestContext::new();
        let andy = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();

        assert_eq!(f.tickets.get_current_ticket(&mut ctx, "bob", false).unwrap(), None);
        let bob = f
            .tickets
            .get_current_ticket(&mut ctx, "bob", true)
            .unwrap()
            .unwrap();
        assert_ne!(andy, bob);
        assert_eq!(ctx.ticket(), Some(bob.as_str()));
    }

    #[test]
    fn current_ticket_replaced_after_invalidation() {
        let f = never();
        let mut ctx = RequestContext::new();
        let first = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();
        f.tickets.invalidate_by_id(&first);

        let second = f
            .tickets
            .get_current_ticket(&mut ctx, "andy", true)
            .unwrap()
            .unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn clear_current_ticket_keeps_store() {
        let f = never();
        let mut ctx = RequestContext::new();
        let id = f.tickets.issue_ticket(&mut ctx, "andy").unwrap();

        f.tickets.clear_current_ticket(&mut ctx);
        assert!(ctx.ticket().is_none());
        assert_eq!(f.tickets.get_authority_for_ticket(&id).unwrap(), "andy");
    }

    #[test]
    fn counting_and_listing() {
        let f = fixture(TicketPolicy::new(
            ExpiryMode::AfterFixedTime,
            Duration::from_secs(5),
            false,
        ));
        let mut ctx = RequestContext::new();
        f.tickets.issue_ticket(&mut ctx, "andy").unwrap();
        f.clock.advance(Duration::from_secs(3));
        f.tickets.issue_ticket(&mut ctx, "bob").unwrap();
        f.tickets.issue_ticket(&mut ctx, "bob").unwrap();
        f.clock.advance(Duration::from_secs(3));

        assert_eq!(f.tickets.count_tickets(false), 3);
        assert_eq!(f.tickets.count_tickets(true), 2);
        assert_eq!(
            f.tickets.users_with_tickets(false).into_iter().collect::<Vec<_>>(),
            vec!["andy", "bob"]
        );
        assert_eq!(
            f.tickets.users_with_tickets(true).into_iter().collect::<Vec<_>>(),
            vec!["bob"]
        );
    }

    #[test]
    fn invalidate_expired_then_all() {
        let f = fixture(TicketPolicy::new(
            ExpiryMode::AfterFixedTime,
            Duration::from_secs(5),
            false,
        ));
        let mut ctx = RequestContext::new();
        f.tickets.issue_ticket(&mut ctx, "andy").unwrap();
        f.clock.advance(Duration::from_secs(6));
        f.tickets.issue_ticket(&mut ctx, "bob").unwrap();

        assert_eq!(f.tickets.invalidate_tickets(true), 1);
        assert_eq!(f.tickets.count_tickets(false), 1);
        assert_eq!(f.tickets.invalidate_tickets(false), 1);
        assert!(f.store.is_empty());
    }

    #[test]
    fn scans_race_benignly_with_issuance() {
        // Counting is not atomic: a ticket issued mid-scan may or may not be
        // counted, but the result always lies between the before/after sizes.
        let f = never();
        let mut ctx = RequestContext::new();
        for _ in 0..100 {
            f.tickets.issue_ticket(&mut ctx, "andy").unwrap();
        }

        let counted = std::thread::scope(|s| {
            let issuer = s.spawn(|| {
                let mut ctx = RequestContext::new();
                for _ in 0..100 {
                    f.tickets.issue_ticket(&mut ctx, "bob").unwrap();
                }
            });
            let counted = f.tickets.count_tickets(true);
            issuer.join().unwrap();
            counted
        });

        assert!((100..=200).contains(&counted));
        assert_eq!(f.tickets.count_tickets(true), 200);
    }

    #[test]
    fn single_ticket_per_user_reuses_live_ticket() {
        let store = Arc::new(InMemoryTicketStore::new());
        let clock = Arc::new(ManualClock::default());
        let tickets = TicketComponent::new(
            store.clone(),
            TicketPolicy::new(ExpiryMode::AfterFixedTime, Duration::from_secs(5), false),
            clock.clone(),
        )
        .with_single_ticket_per_user(true);

        let first = tickets.issue_ticket(&mut RequestContext::new(), "andy").unwrap();
        let second = tickets.issue_ticket(&mut RequestContext::new(), "andy").unwrap();
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);

        let bob = tickets.issue_ticket(&mut RequestContext::new(), "bob").unwrap();
        assert_ne!(first, bob);

        clock.advance(Duration::from_secs(6));
        let third = tickets.issue_ticket(&mut RequestContext::new(), "andy").unwrap();
        assert_ne!(first, third);
    }

    #[test]
    fn single_ticket_per_user_after_invalidation() {
        let store = Arc::new(InMemoryTicketStore::new());
        let tickets = TicketComponent::new(
            store.clone(),
            TicketPolicy::never_expires(),
            Arc::new(ManualClock::default()),
        )
        .with_single_ticket_per_user(true);

        let first = tickets.issue_ticket(&mut RequestContext::new(), "andy").unwrap();
        tickets.invalidate_by_id(&first);
        assert!(store.user_ticket("andy").is_none());

        let second = tickets.issue_ticket(&mut RequestContext::new(), "andy").unwrap();
        assert_ne!(first, second);
    }
}
