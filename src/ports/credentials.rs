//! Credentials port: Trait for verifying a username/password pair.
//!
//! Call sites only see `verify`, so the secret storage behind it can change
//! without touching the login flow.

/// Checks login credentials.
pub trait CredentialVerifier: Send + Sync {
    /// Return `true` if `password` is valid for `username`.
    ///
    /// Unknown users and wrong passwords are indistinguishable to callers.
    fn verify(&self, username: &str, password: &str) -> bool;
}
