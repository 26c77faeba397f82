//! pocketsync - mirrors newly saved Pocket items into linkding
//!
//! This is the daemon entry point: it wires settings, logging and signal
//! handling around the sync scheduler.

use anyhow::{Context, Result};
use bookmarks::settings::parse_log_level;
use bookmarks::{
    BackoffConfig, Checkpoint, LinkdingClient, PocketClient, ResilientTransport, Scheduler,
    SchedulerExit, Settings, SyncEngine,
};
use log::{error, info, warn};
use tokio::signal;
use tokio::sync::broadcast;

fn main() {
    // Initialize logging
    let level = parse_log_level(std::env::var("LOG_LEVEL").ok().as_deref());
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();

    info!("Starting");

    if let Err(e) = run() {
        error!("Failed process: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            if let Some(path) = Settings::default_settings_path() {
                warn!(
                    "Configure pocketsync with environment variables or a settings file at: {}",
                    path.display()
                );
            }
            return Err(e);
        }
    };

    let transport = ResilientTransport::with_ureq(BackoffConfig::bounded_by(settings.schedule));
    let pocket = PocketClient::new(
        transport.clone(),
        &settings.pocket_consumer_key,
        &settings.pocket_access_token,
    );
    let linkding = LinkdingClient::new(
        transport,
        &settings.linkding_url,
        &settings.linkding_access_token,
    )?;

    let checkpoint = Checkpoint::initial(settings.schedule);
    info!(
        "Syncing Pocket into {} every {:?}, starting from {}",
        linkding.bookmarks_url(),
        settings.schedule,
        checkpoint
    );
    let engine = SyncEngine::new(Box::new(pocket), Box::new(linkding), checkpoint);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let result = runtime.block_on(async move {
        tokio::spawn(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(());
        });
        Scheduler::new(engine, settings.schedule).run(shutdown_rx).await
    });

    // An abandoned tick may still be blocked in HTTP or backoff; don't wait for it
    runtime.shutdown_background();

    match result? {
        SchedulerExit::Shutdown => info!("Stopped"),
        SchedulerExit::ShutdownDuringTick => info!("Stopped (in-flight tick abandoned)"),
    }
    Ok(())
}

/// Resolves when Ctrl+C or SIGTERM is received
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
