//! Authentication configuration loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working single-node setup with sliding one-hour tickets.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AuthError, AuthResult};
use crate::password::Encoding;
use crate::ticket::policy::ExpiryMode;

/// Top-level authentication configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub ticket: TicketConfig,
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub identities: IdentityConfig,
    #[serde(default)]
    pub password: PasswordConfig,
}

impl AuthConfig {
    /// Loads configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::ConfigNotFound`] if the file does not exist.
    /// - [`AuthError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> AuthResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AuthError::ConfigNotFound(path.to_path_buf()),
            _ => AuthError::Io(e),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AuthResult<Self> {
        toml::from_str(content).map_err(|e| AuthError::ConfigParse(e.to_string()))
    }
}

/// Ticket expiry and reuse policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketConfig {
    #[serde(default = "default_expiry_mode")]
    pub expiry_mode: ExpiryMode,
    #[serde(
        default = "default_valid_duration",
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub valid_duration: Duration,
    /// Tickets are consumed by their first successful validation.
    #[serde(default)]
    pub one_off: bool,
    /// Hand out the user's existing live ticket instead of minting another.
    #[serde(default)]
    pub use_single_ticket_per_user: bool,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            expiry_mode: default_expiry_mode(),
            valid_duration: default_valid_duration(),
            one_off: false,
            use_single_ticket_per_user: false,
        }
    }
}

/// Checks run before any authenticator is consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// When set, only these users may log in.
    #[serde(default)]
    pub allowed_users: Option<Vec<String>>,
    /// Maximum number of distinct users holding live tickets; negative means unlimited.
    #[serde(default = "default_max_users")]
    pub max_users: i64,
}

impl AdmissionConfig {
    pub fn max_users_limit(&self) -> Option<usize> {
        usize::try_from(self.max_users).ok()
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            allowed_users: None,
            max_users: default_max_users(),
        }
    }
}

/// Reserved identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_guest_user_name")]
    pub guest_user_name: String,
    #[serde(default = "default_system_user_name")]
    pub system_user_name: String,
    #[serde(default = "default_admin_user_names")]
    pub admin_user_names: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_guest_login: bool,
}

impl IdentityConfig {
    /// Whether `user_name` is the guest or system identity, ignoring case.
    pub fn is_reserved(&self, user_name: &str) -> bool {
        user_name.eq_ignore_ascii_case(&self.guest_user_name)
            || user_name.eq_ignore_ascii_case(&self.system_user_name)
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            guest_user_name: default_guest_user_name(),
            system_user_name: default_system_user_name(),
            admin_user_names: default_admin_user_names(),
            allow_guest_login: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    #[serde(default = "default_preferred_encoding")]
    pub preferred_encoding: Encoding,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            preferred_encoding: default_preferred_encoding(),
        }
    }
}

fn default_expiry_mode() -> ExpiryMode {
    ExpiryMode::AfterInactivity
}

fn default_valid_duration() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_max_users() -> i64 {
    -1
}

fn default_guest_user_name() -> String {
    "guest".to_string()
}

fn default_system_user_name() -> String {
    "System".to_string()
}

fn default_admin_user_names() -> Vec<String> {
    vec!["admin".to_string()]
}

fn default_preferred_encoding() -> Encoding {
    Encoding::Argon2
}

fn default_true() -> bool {
    true
}

fn serialize_duration<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

fn deserialize_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}
