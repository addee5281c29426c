use anyhow::Result;
use colored::Colorize;
use paperchat_client::{SecretConfig, SecretStorage};

use super::build_client;

/// Exchanges credentials for a token and stores it for later runs.
pub async fn login(username: &str) -> Result<()> {
    let mut editor = rustyline::DefaultEditor::new()?;
    let password = editor.readline("Password: ")?;

    let client = build_client()?;
    let token = client.login(username, password.trim()).await?;

    SecretStorage::new()?.save(&SecretConfig {
        access_token: Some(token),
    })?;
    println!("{}", "Logged in.".green());
    Ok(())
}

/// Clears the stored token.
pub fn logout() -> Result<()> {
    SecretStorage::new()?.clear()?;
    println!("Logged out.");
    Ok(())
}
