//! Error types for `tessera-core`.
//!
//! All fallible operations in the core library return [`AuthResult<T>`],
//! which is an alias for `Result<T, AuthError>`.

use std::path::PathBuf;

/// Unified error type for authentication and ticket operations.
///
/// None of these are retried inside the core. The only local recovery is the
/// authenticator chain moving on to its next member.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Bad credentials, or no chain member accepted them.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The user is not on the configured allow-list.
    #[error("authentication disallowed for user: {0}")]
    AuthenticationDisallowed(String),

    /// Admitting the user would exceed the configured number of concurrent users.
    #[error("maximum number of users ({max}) already logged in")]
    MaxUsersExceeded { max: usize },

    /// The ticket is unknown, already consumed, or was invalidated.
    #[error("ticket not found")]
    TicketNotFound,

    /// The ticket existed but its expiry policy rejected it.
    #[error("ticket expired")]
    TicketExpired,

    /// A freshly generated ticket key already existed in the store.
    #[error("ticket key collision")]
    TicketCollision,

    /// Guest login was requested but no authenticator allows it.
    #[error("guest login is not supported")]
    GuestNotSupported,

    /// An operation needed an authenticated principal but none was bound.
    #[error("no current user")]
    NoCurrentUser,

    #[error("account disabled")]
    AccountDisabled,

    #[error("account locked")]
    AccountLocked,

    #[error("account expired")]
    AccountExpired,

    #[error("credentials expired")]
    CredentialsExpired,

    #[error("user already exists: {0}")]
    UserExists(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    /// The guest or system identity was used where only real accounts belong.
    #[error("reserved user name: {0}")]
    ReservedUserName(String),

    /// Account maintenance was requested but the chain has no mutable member.
    #[error("authentication chain has no mutable authenticator")]
    ImmutableChain,

    /// Hashing or verifying a password failed.
    #[error("password error: {0}")]
    Password(String),

    /// The configuration file does not exist.
    #[error("config not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// An expiry mode string did not name a known mode.
    #[error("invalid expiry mode: {0}")]
    InvalidExpiryMode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AuthError {
    /// Returns `true` for errors that reject a ticket rather than credentials.
    pub fn is_ticket_error(&self) -> bool {
        matches!(self, AuthError::TicketNotFound | AuthError::TicketExpired)
    }
}

/// Convenience alias used throughout `tessera-core`.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_failed_is_generic() {
        let err = AuthError::AuthenticationFailed;
        assert_eq!(err.to_string(), "authentication failed");
    }

    #[test]
    fn disallowed_displays_user() {
        let err = AuthError::AuthenticationDisallowed("bob".to_string());
        assert_eq!(err.to_string(), "authentication disallowed for user: bob");
    }

    #[test]
    fn max_users_displays_limit() {
        let err = AuthError::MaxUsersExceeded { max: 3 };
        assert_eq!(err.to_string(), "maximum number of users (3) already logged in");
    }

    #[test]
    fn ticket_errors_are_classified() {
        assert!(AuthError::TicketNotFound.is_ticket_error());
        assert!(AuthError::TicketExpired.is_ticket_error());
        assert!(!AuthError::AuthenticationFailed.is_ticket_error());
        assert!(!AuthError::GuestNotSupported.is_ticket_error());
    }

    #[test]
    fn io_error_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: AuthError = io_err.into();
        assert!(matches!(err, AuthError::Io(_)));
        assert!(err.to_string().contains("disk gone"));
    }
}
