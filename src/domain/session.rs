//! Authentication context types.
//!
//! A login yields an opaque `SessionToken`. Every user action resolves the
//! token to an `AuthContext` through the session store before it runs.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Authentication failures.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Wrong username or password. Deliberately does not say which.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Session is not valid")]
    InvalidSession,

    #[error("Credential store error: {0}")]
    CredentialStore(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Opaque bearer token identifying a live session.
///
/// # Security
///
/// - `Debug` does NOT expose the token value
/// - Token bytes are wiped when dropped
#[derive(Clone, PartialEq, Eq, Hash, Zeroize, ZeroizeOnDrop)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a token string (hex encoded).
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to show in logs and the dashboard.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        let end = self.0.len().min(8);
        &self.0[..end]
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionToken({}…)", self.fingerprint())
    }
}

/// Who is acting, resolved per request from a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub username: String,
    pub token: SessionToken,
    pub issued_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_token() {
        let token = SessionToken::new("0123456789abcdef0123456789abcdef");
        let debug = format!("{token:?}");
        assert!(debug.contains("01234567"));
        assert!(!debug.contains("89abcdef0123"));
    }

    #[test]
    fn test_fingerprint_of_short_token() {
        assert_eq!(SessionToken::new("abc").fingerprint(), "abc");
    }
}
