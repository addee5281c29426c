use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "paperchat")]
#[command(about = "Paperchat - converse with your documents from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the access token
    Login {
        /// Account email
        username: String,
    },
    /// Remove the stored access token
    Logout,
    /// List uploaded documents
    Library,
    /// Chat with one document
    Chat {
        /// Document identifier (see `paperchat library`)
        document_id: String,
        /// Display name for the document (defaults to the identifier)
        #[arg(long)]
        name: Option<String>,
        /// Clear the stored transcript before starting
        #[arg(long)]
        reset: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Login { username } => commands::login::login(&username).await,
        Commands::Logout => commands::login::logout(),
        Commands::Library => commands::library::list().await,
        Commands::Chat {
            document_id,
            name,
            reset,
        } => commands::chat::run(&document_id, name.as_deref(), reset).await,
    }
}
