//! Bearer credential with an explicit lifecycle.
//!
//! The credential is an owned value handed to the API client, set on login
//! and cleared on logout, never an ambient lookup. The session layer
//! assumes it is present and valid while a session is active; an expired
//! token surfaces as a generic API failure, not a re-authentication flow.

use std::sync::{Arc, RwLock};

/// Shared, mutable bearer token.
///
/// Cloning yields a handle to the same underlying slot, so a token set
/// after login is visible to every client holding the credential.
#[derive(Debug, Clone, Default)]
pub struct Credential {
    token: Arc<RwLock<Option<String>>>,
}

impl Credential {
    /// Creates an empty credential (no token set).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a credential pre-loaded with a token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(Some(token.into()))),
        }
    }

    /// Installs a token (login).
    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap() = Some(token.into());
    }

    /// Removes the token (logout).
    pub fn clear(&self) {
        *self.token.write().unwrap() = None;
    }

    /// Returns a copy of the current token, if set.
    pub fn get(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }

    /// True when a token is installed.
    pub fn is_set(&self) -> bool {
        self.token.read().unwrap().is_some()
    }
}
