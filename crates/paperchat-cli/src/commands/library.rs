use anyhow::Result;
use colored::Colorize;

use super::build_client;

/// Prints the user's uploaded documents with their chat identifiers.
pub async fn list() -> Result<()> {
    let client = build_client()?;
    let uploads = client.my_uploads().await?;

    if uploads.is_empty() {
        println!("No uploads yet.");
        return Ok(());
    }

    for upload in uploads {
        let when = upload.uploaded_at.as_deref().unwrap_or("-");
        println!(
            "{}  {}  {}",
            upload.metadata_id.dimmed(),
            upload.filename.bold(),
            when
        );
    }
    Ok(())
}
