//! Command execution

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use qdmsync_core::{RecordRepository, SyncRun, SyncService};
use qdmsync_domain::{Config, QdmSyncError};
use qdmsync_infra::{config, QdmService, SqliteDocumentRepository};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span};

use crate::cli::{Cli, Commands, SyncTarget};

pub async fn run(cli: Cli, root: &CancellationToken) -> Result<()> {
    let work_dir = cli.work_dir();
    let config = load_config(&work_dir)?;

    match cli.command {
        Commands::Sync { target } => sync(target, &config, root).await,
    }
}

fn load_config(work_dir: &Path) -> Result<Config> {
    config::load(work_dir)
        .with_context(|| format!("loading configuration from {}", work_dir.display()))
}

async fn sync(target: SyncTarget, config: &Config, root: &CancellationToken) -> Result<()> {
    let span = info_span!("qdm_sync");

    let source = Arc::new(
        QdmService::connect(&config.qdm, &config.sync, root, span.clone())
            .await
            .context("connecting to the QDM API")?,
    );
    let repository = match SqliteDocumentRepository::open(&config.persistence) {
        Ok(repository) => Arc::new(repository),
        Err(err) => {
            source.close();
            return Err(anyhow::Error::new(err).context("opening the document store"));
        }
    };
    let service =
        SyncService::new(source.clone(), repository.clone(), config.sync.clone(), root, span);

    let outcome = run_target(target, &service).await;

    service.close();
    source.close();
    release(repository.as_ref(), outcome).await
}

async fn run_target(target: SyncTarget, service: &SyncService) -> Result<()> {
    match target {
        SyncTarget::Orders(args) => {
            let window = args.window(Local::now())?;
            report(service.sync_orders(window).await).await
        }
        SyncTarget::Customers(args) => {
            let window = args.window(Local::now())?;
            report(service.sync_customers(window).await).await
        }
        SyncTarget::CustomerGroups => {
            let stored = service.sync_customer_groups().await?;
            print_line(&format!("record stored: {stored}"));
            Ok(())
        }
    }
}

/// Disconnect the store whatever the sync's outcome; the sync's own error
/// takes precedence over a disconnect failure.
async fn release(repository: &dyn RecordRepository, outcome: Result<()>) -> Result<()> {
    let disconnected = repository.disconnect().await;
    outcome?;
    disconnected.context("closing the document store")
}

/// Print progress until the run stops, then its outcome.
async fn report(started: qdmsync_domain::Result<SyncRun>) -> Result<()> {
    let mut run = match started {
        Ok(run) => run,
        Err(QdmSyncError::EmptyResult) => {
            print_line("nothing to sync in this window");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    info!(total = run.total(), "sync started");
    while let Some(progress) = run.next_progress().await {
        print_line(&format!(
            "synchronizing {} / {} ({:.0}%)",
            progress.current,
            progress.total,
            progress.percent()
        ));
    }

    let report = run.finish().await?;
    if report.cancelled {
        print_line(&format!("sync cancelled: {} / {} stored", report.synced, report.total));
    } else {
        print_line(&format!("sync completed: {} records stored", report.synced));
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_line(line: &str) {
    println!("{line}");
}
