//! Portcullis - Main Entry Point

use std::sync::Arc;

use clap::Parser;
use portcullis::{AppContext, Cli, commands};
use portcullis_application::ports::SessionStorage;
use portcullis_infrastructure::{FileSessionStorage, load_settings};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(auth_url) = cli.auth_url {
        settings.auth_base_url = auth_url;
    }

    let storage: Arc<dyn SessionStorage> = match cli.session_file {
        Some(path) => Arc::new(FileSessionStorage::new(path)),
        None => Arc::new(FileSessionStorage::open_default()?),
    };

    tracing::debug!(
        "Starting Portcullis v{} against {}",
        env!("CARGO_PKG_VERSION"),
        settings.auth_base_url
    );

    let ctx = AppContext::build(settings, storage).await?;
    let mut stdout = std::io::stdout().lock();
    commands::run(cli.command, &ctx, &mut stdout).await?;

    Ok(())
}
