//! Session store: login, per-action token resolution, logout.
//!
//! # Security
//!
//! Tokens are 256 bits from a ChaCha20 CSPRNG seeded from OS entropy and
//! are only ever logged by fingerprint. Sessions live in memory and end with
//! the process.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::domain::{AuthContext, AuthError, SessionToken};
use crate::ports::CredentialVerifier;

/// Token length in bytes before hex encoding.
const TOKEN_BYTES: usize = 32;

/// Issues and resolves session tokens for a credential verifier.
pub struct SessionStore<V: CredentialVerifier> {
    verifier: V,
    sessions: Mutex<HashMap<SessionToken, AuthContext>>,
    rng: Mutex<ChaCha20Rng>,
}

impl<V: CredentialVerifier> SessionStore<V> {
    #[must_use]
    pub fn new(verifier: V) -> Self {
        Self {
            verifier,
            sessions: Mutex::new(HashMap::new()),
            rng: Mutex::new(ChaCha20Rng::from_entropy()),
        }
    }

    fn new_token(&self) -> SessionToken {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_bytes(&mut bytes);
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        SessionToken::new(hex)
    }

    /// Verify credentials and open a session.
    ///
    /// # Errors
    /// Returns `InvalidCredentials` for an unknown user or wrong password.
    pub fn login(&self, username: &str, password: &str) -> Result<SessionToken, AuthError> {
        if !self.verifier.verify(username, password) {
            tracing::warn!("Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.new_token();
        let ctx = AuthContext {
            username: username.to_string(),
            token: token.clone(),
            issued_at: Utc::now(),
        };
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.clone(), ctx);

        tracing::info!(
            user = %username,
            "Session opened ({})",
            token.fingerprint()
        );
        Ok(token)
    }

    /// Resolve a token to the context of its live session.
    ///
    /// # Errors
    /// Returns `InvalidSession` for unknown or revoked tokens.
    pub fn resolve(&self, token: &SessionToken) -> Result<AuthContext, AuthError> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidSession)
    }

    /// Revoke a session. Returns `false` if it was not live.
    pub fn logout(&self, token: &SessionToken) -> bool {
        let removed = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);
        if let Some(ctx) = &removed {
            tracing::info!(user = %ctx.username, "Session closed ({})", token.fingerprint());
        }
        removed.is_some()
    }

    #[cfg(test)]
    pub(crate) fn active_sessions(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StaticCredentials;

    fn store() -> SessionStore<StaticCredentials> {
        SessionStore::new(StaticCredentials::new().with_user("admin", "password123"))
    }

    #[test]
    fn test_login_resolve_logout() {
        let store = store();
        let token = store.login("admin", "password123").expect("login");
        assert_eq!(token.as_str().len(), 64);
        assert!(token.as_str().chars().all(|c| c.is_ascii_hexdigit()));

        let ctx = store.resolve(&token).expect("resolve");
        assert_eq!(ctx.username, "admin");
        assert_eq!(ctx.token, token);

        assert!(store.logout(&token));
        assert!(!store.logout(&token));
        assert!(matches!(
            store.resolve(&token),
            Err(AuthError::InvalidSession)
        ));
    }

    #[test]
    fn test_bad_credentials_are_indistinguishable() {
        let store = store();
        let wrong_password = store.login("admin", "nope").expect_err("must fail");
        let wrong_user = store.login("root", "password123").expect_err("must fail");
        assert_eq!(wrong_password.to_string(), wrong_user.to_string());
        assert_eq!(store.active_sessions(), 0);
    }

    #[test]
    fn test_tokens_are_unique() {
        let store = store();
        let a = store.login("admin", "password123").expect("login");
        let b = store.login("admin", "password123").expect("login");
        assert_ne!(a, b);
        assert_eq!(store.active_sessions(), 2);
    }

    #[test]
    fn test_forged_token_is_rejected() {
        let store = store();
        let forged = SessionToken::new("0".repeat(64));
        assert!(matches!(
            store.resolve(&forged),
            Err(AuthError::InvalidSession)
        ));
    }
}
