#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Username and password gate.
//!
//! Credentials are a TOML `[passwords]` table mapping each username to the
//! hex SHA-256 digest of its password:
//!
//! ```toml
//! [passwords]
//! analyst = "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
//! ```
//!
//! Plain-text passwords are never stored; only digests are compared.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Length of a SHA-256 digest in bytes.
const DIGEST_LEN: usize = 32;

/// Errors from loading credentials or unlocking the gate.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The credentials file is not valid TOML or does not match the schema.
    #[error("Invalid credentials: {0}")]
    Toml(#[from] toml::de::Error),

    /// A stored digest is not 64 hex characters.
    #[error("Stored digest for {user} is not a hex SHA-256 digest")]
    InvalidDigest {
        /// User whose entry is malformed.
        user: String,
    },

    /// The username is not in the credentials table.
    #[error("User not known")]
    UnknownUser,

    /// The password does not match.
    #[error("Password incorrect")]
    IncorrectPassword,
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    passwords: BTreeMap<String, String>,
}

/// Username to password digest table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    digests: BTreeMap<String, [u8; DIGEST_LEN]>,
}

impl Credentials {
    /// Parses a credentials TOML document.
    ///
    /// # Errors
    ///
    /// * [`AccessError::Toml`] if the document does not parse.
    /// * [`AccessError::InvalidDigest`] if a digest is malformed.
    pub fn from_toml(toml_str: &str) -> Result<Self, AccessError> {
        let file: CredentialsFile = toml::de::from_str(toml_str)?;

        let mut digests = BTreeMap::new();
        for (user, digest_hex) in file.passwords {
            let mut digest = [0_u8; DIGEST_LEN];
            if hex::decode_to_slice(digest_hex.trim(), &mut digest).is_err() {
                return Err(AccessError::InvalidDigest { user });
            }
            digests.insert(user, digest);
        }

        log::debug!("Loaded credentials for {} users", digests.len());
        Ok(Self { digests })
    }

    /// Adds or replaces a user.
    pub fn insert(&mut self, user: impl Into<String>, password: &str) {
        self.digests.insert(user.into(), digest(password));
    }

    /// Number of users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Returns `true` if no user can unlock the gate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }

    fn verify(&self, user: &str, password: &str) -> Result<(), AccessError> {
        let stored = self.digests.get(user).ok_or(AccessError::UnknownUser)?;
        if digests_match(stored, &digest(password)) {
            Ok(())
        } else {
            Err(AccessError::IncorrectPassword)
        }
    }
}

fn digest(password: &str) -> [u8; DIGEST_LEN] {
    Sha256::digest(password.as_bytes()).into()
}

/// Compares every byte, with no early exit.
fn digests_match(a: &[u8; DIGEST_LEN], b: &[u8; DIGEST_LEN]) -> bool {
    a.iter().zip(b).fold(0_u8, |diff, (x, y)| diff | (x ^ y)) == 0
}

/// Hex SHA-256 digest of a password, as stored in the credentials table.
#[must_use]
pub fn password_digest_hex(password: &str) -> String {
    hex::encode(digest(password))
}

/// Whether the data views are available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum AccessState {
    /// No data may be shown.
    #[default]
    Locked,
    /// A user has authenticated.
    Unlocked {
        /// Authenticated username.
        user: String,
    },
}

/// Two-state gate in front of the data views.
#[derive(Debug, Clone)]
pub struct AccessGate {
    credentials: Credentials,
    state: AccessState,
}

impl AccessGate {
    /// Creates a locked gate.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            state: AccessState::Locked,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &AccessState {
        &self.state
    }

    /// Returns `true` once a user has authenticated.
    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        matches!(self.state, AccessState::Unlocked { .. })
    }

    /// Checks a username and password. On success the gate unlocks for
    /// that user; on failure it stays (or becomes) locked.
    ///
    /// # Errors
    ///
    /// * [`AccessError::UnknownUser`] if the user is not listed.
    /// * [`AccessError::IncorrectPassword`] if the password is wrong.
    pub fn unlock(&mut self, user: &str, password: &str) -> Result<(), AccessError> {
        match self.credentials.verify(user, password) {
            Ok(()) => {
                log::info!("Unlocked for {user}");
                self.state = AccessState::Unlocked {
                    user: user.to_string(),
                };
                Ok(())
            }
            Err(e) => {
                log::warn!("Unlock attempt for {user} failed: {e}");
                self.state = AccessState::Locked;
                Err(e)
            }
        }
    }

    /// Returns to the locked state.
    pub fn lock(&mut self) {
        self.state = AccessState::Locked;
    }
}
