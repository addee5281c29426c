//! Error types for the Paperchat client.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the client-side chat stack.
///
/// This provides typed, structured error variants that mirror the failure
/// boundaries the session layer cares about: transport, transcript
/// persistence, local validation, and structured API errors.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ChatError {
    /// Network or server failure on any remote call
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The transcript store could not be reached or rejected the call
    #[error("Transcript store unavailable: {0}")]
    StoreUnavailable(String),

    /// Local input validation failure (never reaches the network)
    #[error("Validation failure: {0}")]
    Validation(String),

    /// Structured error returned by the remote API
    #[error("API error (status {status:?}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Api {
        status: Option<u16>,
        /// Human-readable detail string supplied by the service, if any
        detail: Option<String>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a StoreUnavailable error
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(message.into())
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an Api error from a status code and optional detail string
    pub fn api(status: Option<u16>, detail: Option<String>) -> Self {
        Self::Api { status, detail }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a StoreUnavailable error
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The service-provided detail string, when the remote API supplied one.
    ///
    /// The session orchestrator uses this to surface the best available
    /// error text to the user instead of a raw technical message.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// A type alias for `Result<T, ChatError>`.
pub type Result<T> = std::result::Result<T, ChatError>;
