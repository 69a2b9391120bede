//! gigwatch — watches the Upwork job search and broadcasts new listings.
//!
//! Runs two long-lived tasks:
//! - the watcher loop, polling the source once per interval
//! - an HTTP server answering uptime probes on `GET /`
//!
//! `--once` runs a single ingestion cycle and exits, with no server.

use std::sync::Arc;

use clap::Parser;
use tokio::sync::Notify;
use tracing::info;

use gigwatch_core::{config, Config};
use gigwatch_notify::{Notifier, TelegramNotifier};
use gigwatch_server::health::{self, AppState};
use gigwatch_server::watcher::{Watcher, WatcherOptions};
use gigwatch_source::{ListingSource, UpworkSource};
use gigwatch_store::ListingStore;

// ── CLI ─────────────────────────────────────────────────────────────

/// Job-listing watcher: poll, dedup, persist, broadcast.
#[derive(Parser, Debug)]
#[command(name = "gigwatch", version, about)]
struct Cli {
    /// Run one ingestion cycle and exit instead of starting the service.
    #[arg(long)]
    once: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    config::load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    let bot_token = config
        .telegram
        .bot_token
        .clone()
        .ok_or_else(|| anyhow::anyhow!("TELEGRAM_BOT_TOKEN is not set"))?;
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(bot_token)?);
    let source: Arc<dyn ListingSource> = Arc::new(UpworkSource::new(config.source.clone())?);
    let store = ListingStore::new(config.store.path.clone());

    let watcher = Arc::new(Watcher::new(
        source,
        store,
        notifier.clone(),
        WatcherOptions::from_config(&config),
    ));

    if cli.once {
        let outcome = watcher.run_once().await?;
        info!(
            fetched = outcome.fetched,
            new = outcome.new_listings,
            notified = outcome.notified,
            "single cycle complete"
        );
        return Ok(());
    }

    let shutdown = Arc::new(Notify::new());

    let watcher_task = tokio::spawn({
        let watcher = watcher.clone();
        let shutdown = shutdown.clone();
        async move { watcher.run(shutdown).await }
    });

    let signal_task = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            os_signal().await;
            info!("shutdown signal received");
            shutdown.notify_waiters();
        }
    });

    let state = Arc::new(AppState {
        notifier,
        ops_chat: config.telegram.ops_chat_id.clone(),
    });
    let app = health::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "health endpoint listening");

    axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move { shutdown.notified().await }
        })
        .await?;

    watcher_task.await?;
    signal_task.abort();
    info!("gigwatch exited cleanly");

    Ok(())
}

/// Wait for SIGINT or SIGTERM (Unix) or Ctrl+C (cross-platform fallback).
async fn os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to register SIGINT");
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl_c");
    }
}
