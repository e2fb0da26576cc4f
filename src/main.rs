mod api;
mod config;
mod error;
mod fetcher;
mod poller;
mod render;
mod state;
mod types;

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, FAILURE_CHANNEL_CAPACITY};
use crate::error::Result;
use crate::fetcher::HttpFetcher;
use crate::poller::StatusPoller;
use crate::state::DisplayBoard;
use crate::types::CheckFailure;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let fetcher = Arc::new(HttpFetcher::new(cfg.base_url.clone(), cfg.request_timeout)?);
    info!(
        "Polling {} for app {} (timeout {}ms)",
        fetcher.base_url(),
        cfg.app_id,
        cfg.request_timeout.as_millis(),
    );

    // --- Display board ---
    let board = DisplayBoard::with_rows(cfg.interface_ids.clone());
    if cfg.interface_ids.is_empty() {
        warn!("INTERFACE_IDS not set: no interface rows until added via PUT /rows/{{id}}");
    } else {
        info!("Interface rows ({}): {}", cfg.interface_ids.len(), cfg.interface_ids.join(", "));
    }

    // --- Failure consumer ---
    let (failure_tx, failure_rx) = mpsc::channel(FAILURE_CHANNEL_CAPACITY);
    let failure_board = Arc::clone(&board);
    tokio::spawn(async move {
        failure_consumer(failure_rx, failure_board).await;
    });

    // --- Status poller ---
    let latency = Arc::new(LatencyStats::new());
    let poller = Arc::new(StatusPoller::new(
        cfg.app_id,
        fetcher,
        Arc::clone(&board),
        Arc::clone(&latency),
    ));
    let monitor = Arc::new(poller.start(cfg.cadences, Some(failure_tx)));

    // --- HTTP API server ---
    let api_state = ApiState {
        app_id: cfg.app_id,
        board,
        latency,
        monitor: Arc::clone(&monitor),
    };
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, router(api_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor.shutdown();
    Ok(())
}

/// Records each failure on the board so the API can show what went stale and why.
async fn failure_consumer(mut rx: mpsc::Receiver<CheckFailure>, board: Arc<DisplayBoard>) {
    while let Some(failure) = rx.recv().await {
        board.record_failure(failure);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
