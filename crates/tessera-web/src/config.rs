use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use tessera_core::{AuthConfig, Encoding, ExpiryMode, HashedPassword, UserRecord};

/// A seeded account. `password_hash` is an Argon2 PHC string unless
/// `encodings` says otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password_hash: String,
    #[serde(default = "default_encodings")]
    pub encodings: Vec<Encoding>,
    #[serde(default)]
    pub salt: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl UserConfig {
    pub fn to_record(&self) -> UserRecord {
        let mut record = UserRecord::new(
            &self.username,
            HashedPassword {
                encodings: self.encodings.clone(),
                salt: self.salt.clone(),
                hash: self.password_hash.clone(),
            },
        );
        record.enabled = self.enabled;
        record
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_login_rpm")]
    pub login_requests_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { login_requests_per_minute: default_login_rpm() }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Periodic removal of expired tickets.
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    #[serde(default = "default_cleanup_interval_secs")]
    pub interval_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self { interval_secs: default_cleanup_interval_secs() }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 9090))
}

fn default_login_rpm() -> u32 { 5 }
fn default_cleanup_interval_secs() -> u64 { 60 }
fn default_true() -> bool { true }

fn default_encodings() -> Vec<Encoding> {
    vec![Encoding::Argon2]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            tls: TlsConfig::default(),
            cleanup: CleanupConfig::default(),
            users: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Returns `true` if any account is configured.
    pub fn has_auth(&self) -> bool {
        !self.users.is_empty()
    }

    pub fn tls_enabled(&self) -> bool {
        self.tls.cert_path.is_some() && self.tls.key_path.is_some()
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.check_users()?;
        Ok(config)
    }

    /// Seeded accounts may not take the guest or system name.
    fn check_users(&self) -> anyhow::Result<()> {
        if let Some(user) = self
            .users
            .iter()
            .find(|u| self.auth.identities.is_reserved(&u.username))
        {
            anyhow::bail!("user '{}' uses a reserved name", user.username);
        }
        Ok(())
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("TESSERA_WEB_CONFIG")
            .map(PathBuf::from)
            .ok();

        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(&path)?;
            Self::from_toml(&contents)?
        } else {
            ServerConfig::default()
        };

        if let Ok(addr) = std::env::var("TESSERA_BIND_ADDR") {
            config.bind_addr = addr.parse()?;
        }

        if let Ok(cert) = std::env::var("TESSERA_TLS_CERT") {
            config.tls.cert_path = Some(cert);
        }
        if let Ok(key) = std::env::var("TESSERA_TLS_KEY") {
            config.tls.key_path = Some(key);
        }

        if let Ok(mode) = std::env::var("TESSERA_TICKET_EXPIRY_MODE") {
            config.auth.ticket.expiry_mode = mode.parse::<ExpiryMode>()?;
        }
        if let Ok(val) = std::env::var("TESSERA_TICKET_VALID_DURATION") {
            config.auth.ticket.valid_duration = humantime::parse_duration(&val)?;
        }
        if let Ok(val) = std::env::var("TESSERA_MAX_USERS") {
            config.auth.admission.max_users = val.parse()?;
        }

        config.restrict_bind(std::env::var("TESSERA_INSECURE").is_ok());
        Ok(config)
    }

    /// Without configured accounts only guests can log in; keep such a server
    /// off the network unless explicitly told otherwise.
    fn restrict_bind(&mut self, insecure: bool) {
        if self.has_auth() || !self.bind_addr.ip().is_unspecified() {
            return;
        }
        if insecure {
            tracing::warn!(
                "No users configured and listening on all interfaces ({}).",
                self.bind_addr
            );
        } else {
            let safe_addr: SocketAddr = ([127, 0, 0, 1], self.bind_addr.port()).into();
            tracing::warn!(
                "No users configured. Binding to {} instead of {} for safety. \
                 Set TESSERA_INSECURE=1 to override (NOT RECOMMENDED).",
                safe_addr, self.bind_addr
            );
            self.bind_addr = safe_addr;
        }
    }
}
