//! Ticket expiry policy.
//!
//! Pure decision logic: the policy holds nothing but its configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::to_time_delta;
use crate::config::TicketConfig;
use crate::error::AuthError;

use super::Ticket;

/// How a ticket's age is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExpiryMode {
    /// Tickets never expire.
    Never,
    /// Tickets expire a fixed duration after issue.
    AfterFixedTime,
    /// Tickets expire after a period without successful validation.
    AfterInactivity,
}

impl ExpiryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryMode::Never => "NONE",
            ExpiryMode::AfterFixedTime => "AFTER_FIXED_TIME",
            ExpiryMode::AfterInactivity => "AFTER_INACTIVITY",
        }
    }
}

impl fmt::Display for ExpiryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpiryMode {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" | "NEVER" => Ok(ExpiryMode::Never),
            "AFTER_FIXED_TIME" => Ok(ExpiryMode::AfterFixedTime),
            "AFTER_INACTIVITY" => Ok(ExpiryMode::AfterInactivity),
            _ => Err(AuthError::InvalidExpiryMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for ExpiryMode {
    type Error = AuthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExpiryMode> for String {
    fn from(mode: ExpiryMode) -> Self {
        mode.as_str().to_string()
    }
}

/// Expiry and consumption rules applied by the ticket component.
#[derive(Debug, Clone)]
pub struct TicketPolicy {
    mode: ExpiryMode,
    valid_duration: TimeDelta,
    one_off: bool,
}

impl TicketPolicy {
    pub fn new(mode: ExpiryMode, valid_duration: Duration, one_off: bool) -> Self {
        Self {
            mode,
            valid_duration: to_time_delta(valid_duration),
            one_off,
        }
    }

    /// Multi-use tickets that never expire.
    pub fn never_expires() -> Self {
        Self::new(ExpiryMode::Never, Duration::ZERO, false)
    }

    pub fn from_config(config: &TicketConfig) -> Self {
        Self::new(config.expiry_mode, config.valid_duration, config.one_off)
    }

    pub fn mode(&self) -> ExpiryMode {
        self.mode
    }

    pub fn valid_duration(&self) -> TimeDelta {
        self.valid_duration
    }

    /// The lifetime given to new tickets, or `None` when they never expire.
    pub fn lifetime(&self) -> Option<TimeDelta> {
        match self.mode {
            ExpiryMode::Never => None,
            ExpiryMode::AfterFixedTime | ExpiryMode::AfterInactivity => Some(self.valid_duration),
        }
    }

    /// Whether `ticket` is past its lifetime at `now`.
    ///
    /// A zero duration in fixed-time mode expires a ticket the moment the
    /// clock moves past its creation instant.
    pub fn has_expired(&self, ticket: &Ticket, now: DateTime<Utc>) -> bool {
        if !ticket.expires() {
            return false;
        }
        let anchor = match self.mode {
            ExpiryMode::Never => return false,
            ExpiryMode::AfterFixedTime => ticket.created_at(),
            ExpiryMode::AfterInactivity => ticket.last_access(),
        };
        match anchor.checked_add_signed(self.valid_duration) {
            Some(deadline) => now > deadline,
            None => false,
        }
    }

    /// Whether a successful validation consumes the ticket.
    pub fn should_consume_on_use(&self) -> bool {
        self.one_off
    }

    /// Records an access at `now`. Only sliding expiry moves the deadline.
    pub fn refresh(&self, ticket: &Ticket, now: DateTime<Utc>) -> Option<Ticket> {
        match self.mode {
            ExpiryMode::AfterInactivity => Some(ticket.touched(now, self.lifetime())),
            ExpiryMode::Never | ExpiryMode::AfterFixedTime => None,
        }
    }
}
