//! HTTP infrastructure for the Paperchat client.
//!
//! This crate implements the collaborator traits from `paperchat-core`
//! against the remote document service: transcript history and saves,
//! extraction triggers, question answering, plus authentication and the
//! on-disk token storage the CLI uses between runs.

pub mod api;
pub mod config;
pub mod credential;
pub mod secret_storage;

pub use api::{ApiClient, UploadEntry};
pub use config::ClientConfig;
pub use credential::Credential;
pub use secret_storage::{SecretConfig, SecretStorage};
