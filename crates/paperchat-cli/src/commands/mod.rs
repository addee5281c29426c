pub mod chat;
pub mod library;
pub mod login;

use anyhow::Result;
use paperchat_client::{ApiClient, ClientConfig, Credential, SecretStorage};

/// Builds an API client wired to the stored token, if any.
pub fn build_client() -> Result<ApiClient> {
    let config = ClientConfig::load()?;
    let secret = SecretStorage::new()?.load()?;
    let credential = match secret.access_token {
        Some(token) => Credential::with_token(token),
        None => Credential::new(),
    };
    Ok(ApiClient::new(&config, credential)?)
}
