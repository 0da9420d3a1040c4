//! Credential verifiers.
//!
//! `Argon2Credentials` reads a JSON object mapping usernames to Argon2id PHC
//! strings (produced by the `hash_password` binary):
//!
//! ```json
//! { "admin": "$argon2id$v=19$m=19456,t=2,p=1$..." }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use zeroize::Zeroizing;

use crate::domain::AuthError;
use crate::ports::CredentialVerifier;

fn argon2() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Hash `password` into a PHC string with a fresh random salt.
///
/// # Errors
/// Returns `Hashing` if Argon2 rejects the input.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt_bytes = [0u8; 16];
    ChaCha20Rng::from_entropy().fill_bytes(&mut salt_bytes);
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Hashing(e.to_string()))?;

    argon2()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Username to Argon2 hash table, usually loaded from disk.
#[derive(Debug, Clone, Default)]
pub struct Argon2Credentials {
    hashes: HashMap<String, String>,
}

impl Argon2Credentials {
    /// Load the credentials file.
    ///
    /// # Errors
    /// Returns `CredentialStore` if the file is missing, is not a JSON object
    /// of strings, or contains an entry that is not a PHC hash.
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let raw = fs::read_to_string(path).map_err(|e| {
            AuthError::CredentialStore(format!("cannot read {}: {e}", path.display()))
        })?;
        let hashes: HashMap<String, String> = serde_json::from_str(&raw)
            .map_err(|e| AuthError::CredentialStore(format!("{}: {e}", path.display())))?;

        let creds = Self::from_hashes(hashes)?;
        tracing::info!(
            "Loaded {} credential(s) from {:?}",
            creds.hashes.len(),
            path
        );
        Ok(creds)
    }

    /// Build from an in-memory table, checking every hash parses.
    ///
    /// # Errors
    /// Returns `CredentialStore` naming the first user with a bad hash.
    pub fn from_hashes(hashes: HashMap<String, String>) -> Result<Self, AuthError> {
        for (user, hash) in &hashes {
            PasswordHash::new(hash).map_err(|_| {
                AuthError::CredentialStore(format!("entry for {user:?} is not a PHC hash"))
            })?;
        }
        Ok(Self { hashes })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

impl CredentialVerifier for Argon2Credentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        let Some(stored) = self.hashes.get(username) else {
            return false;
        };
        match PasswordHash::new(stored) {
            Ok(parsed) => argon2()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Plaintext credential table for tests and local demos.
#[derive(Default)]
pub struct StaticCredentials {
    users: HashMap<String, Zeroizing<String>>,
}

impl StaticCredentials {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(mut self, username: &str, password: &str) -> Self {
        self.users
            .insert(username.to_string(), Zeroizing::new(password.to_string()));
        self
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|expected| expected.as_str() == password)
    }
}
