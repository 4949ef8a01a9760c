//! qdm-sync - command line entry point
//!
//! Loads `.env`, installs logging, parses the command line and runs the
//! requested sync. Ctrl-C cancels every running task.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod cli;
mod commands;
mod logging;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before logging so RUST_LOG from the file applies
    let dotenv = dotenvy::dotenv();
    logging::init()?;
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) => debug!("no .env file loaded: {e}"),
    }

    let cli = Cli::parse();

    let root = CancellationToken::new();
    let interrupt = root.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            interrupt.cancel();
        }
    });

    commands::run(cli, &root).await
}
