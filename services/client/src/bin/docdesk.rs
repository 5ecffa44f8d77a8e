//! services/client/src/bin/docdesk.rs

use clap::Parser;
use client_lib::{
    adapters::{DirectorySaveSink, FileStorage, HttpGateway, TerminalConfirmation},
    cli::{self, Cli},
    config::Config,
    error::ClientError,
};
use docdesk_core::{ClientContext, SessionStore};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    debug!(api_url = %config.api_url, "configuration loaded");

    // --- 2. Restore the Persisted Session ---
    let storage = Arc::new(FileStorage::new(config.session_dir.clone()));
    let session = Arc::new(SessionStore::new(storage));
    if let Some(restored) = session.restore() {
        info!(user = %restored.identity.username, "using stored session");
    }

    // --- 3. Initialize Adapters ---
    let gateway = Arc::new(HttpGateway::new(
        &config.api_url,
        config.request_timeout,
        session.clone(),
    )?);
    let confirmation = Arc::new(TerminalConfirmation::new(cli.yes));
    let saver = Arc::new(DirectorySaveSink::new(config.download_dir.clone()));

    // --- 4. Build the Context and Run the Command ---
    let ctx = ClientContext::new(session, gateway, confirmation, saver);
    cli::run(cli, &ctx).await
}
