//! Password hashing.
//!
//! A stored password records the chain of encodings that produced it, so
//! hashes written by older releases keep verifying. `["sha256", "argon2"]`
//! means argon2 applied to the salted SHA-256 digest. After a successful login
//! a hash whose chain is not exactly the preferred encoding is re-encoded.

use std::fmt;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{AuthError, AuthResult};

/// A single hashing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Argon2id PHC string with an embedded random salt. Only valid as the last step.
    Argon2,
    /// Hex SHA-256 over the record salt followed by the input. Legacy.
    Sha256,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Argon2 => "argon2",
            Encoding::Sha256 => "sha256",
        }
    }

    fn is_deterministic(&self) -> bool {
        matches!(self, Encoding::Sha256)
    }

    fn encode(&self, value: &str, salt: &str) -> AuthResult<String> {
        match self {
            Encoding::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(salt.as_bytes());
                hasher.update(value.as_bytes());
                Ok(format!("{:x}", hasher.finalize()))
            }
            Encoding::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                let hash = Argon2::default()
                    .hash_password(value.as_bytes(), &salt)
                    .map_err(|e| AuthError::Password(format!("failed to hash password: {e}")))?;
                Ok(hash.to_string())
            }
        }
    }

    fn verify(&self, value: &str, salt: &str, expected: &str) -> AuthResult<bool> {
        match self {
            Encoding::Sha256 => {
                let actual = self.encode(value, salt)?;
                Ok(bool::from(actual.as_bytes().ct_eq(expected.as_bytes())))
            }
            Encoding::Argon2 => {
                let parsed = PasswordHash::new(expected)
                    .map_err(|e| AuthError::Password(format!("invalid password hash: {e}")))?;
                Ok(Argon2::default()
                    .verify_password(value.as_bytes(), &parsed)
                    .is_ok())
            }
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored password: the encodings applied, the record salt and the result.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedPassword {
    pub encodings: Vec<Encoding>,
    #[serde(default)]
    pub salt: String,
    pub hash: String,
}

impl HashedPassword {
    /// Wraps an Argon2 PHC string such as the output of `hash_password`.
    pub fn argon2(phc: impl Into<String>) -> Self {
        Self {
            encodings: vec![Encoding::Argon2],
            salt: String::new(),
            hash: phc.into(),
        }
    }
}

// The hash is deliberately left out of debug output.
impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("encodings", &self.encodings)
            .finish_non_exhaustive()
    }
}

/// Encodes with a preferred encoding and verifies any supported chain.
#[derive(Debug, Clone)]
pub struct CompositePasswordEncoder {
    preferred: Encoding,
}

impl CompositePasswordEncoder {
    pub fn new(preferred: Encoding) -> Self {
        Self { preferred }
    }

    pub fn preferred(&self) -> Encoding {
        self.preferred
    }

    /// Hashes `raw` with the preferred encoding and a fresh record salt.
    pub fn encode(&self, raw: &str) -> AuthResult<HashedPassword> {
        let salt = uuid::Uuid::new_v4().to_string();
        let hash = self.preferred.encode(raw, &salt)?;
        Ok(HashedPassword {
            encodings: vec![self.preferred],
            salt,
            hash,
        })
    }

    /// Applies `encodings` in order to `raw`.
    ///
    /// # Errors
    ///
    /// [`AuthError::Password`] if the chain is empty or a salted random step
    /// is followed by another step.
    pub fn encode_chain(
        &self,
        encodings: &[Encoding],
        raw: &str,
        salt: &str,
    ) -> AuthResult<HashedPassword> {
        let (last, init) = split_chain(encodings)?;
        let pre = pre_hash(init, raw, salt)?;
        Ok(HashedPassword {
            encodings: encodings.to_vec(),
            salt: salt.to_string(),
            hash: last.encode(&pre, salt)?,
        })
    }

    /// Whether `raw` produces `stored`.
    pub fn matches(&self, stored: &HashedPassword, raw: &str) -> AuthResult<bool> {
        let (last, init) = split_chain(&stored.encodings)?;
        let pre = pre_hash(init, raw, &stored.salt)?;
        last.verify(&pre, &stored.salt, &stored.hash)
    }

    /// Whether `stored` was produced by something other than the preferred encoding alone.
    pub fn needs_upgrade(&self, stored: &HashedPassword) -> bool {
        stored.encodings[..] != [self.preferred]
    }
}

impl Default for CompositePasswordEncoder {
    fn default() -> Self {
        Self::new(Encoding::Argon2)
    }
}

fn split_chain(encodings: &[Encoding]) -> AuthResult<(&Encoding, &[Encoding])> {
    let (last, init) = encodings
        .split_last()
        .ok_or_else(|| AuthError::Password("empty encoding chain".to_string()))?;
    if let Some(step) = init.iter().find(|e| !e.is_deterministic()) {
        return Err(AuthError::Password(format!(
            "{step} can only be the last encoding in a chain"
        )));
    }
    Ok((last, init))
}

fn pre_hash(steps: &[Encoding], raw: &str, salt: &str) -> AuthResult<String> {
    steps
        .iter()
        .try_fold(raw.to_string(), |value, step| step.encode(&value, salt))
}
