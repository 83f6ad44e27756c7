//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Bind the listener and run the accept loop
//! - Drain in-flight connections after a stop signal
//!
//! # Design Decisions
//! - Fail fast: a bind failure is fatal
//! - The listener starts last (traffic only when ready)
//! - Draining is bounded; stragglers are abandoned at exit

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::config::ProxyConfig;
use crate::http::ProxyServer;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;

/// How long in-flight connections get to finish after shutdown begins.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Run the proxy until SIGINT/SIGTERM.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    let shutdown = Shutdown::new();
    let _signals = spawn_signal_listener(shutdown.clone());
    run_until(config, shutdown).await
}

/// Run the proxy until `shutdown` is triggered.
pub async fn run_until(config: ProxyConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        cache_enabled = config.cache.enabled,
        cache_slots = config.cache.slots,
        max_object_size = config.cache.max_object_size,
        "Configuration loaded"
    );

    let listener = Listener::bind(&config.listener).await?;
    let server = ProxyServer::new(&config);
    let state = server.state();
    let tracker = server.tracker();

    server.run(listener, shutdown.subscribe()).await?;

    let in_flight = tracker.active_count();
    if in_flight > 0 {
        tracing::info!(in_flight, "Draining connections");
        if tokio::time::timeout(DRAIN_TIMEOUT, tracker.wait_for_idle())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = tracker.active_count(),
                "Drain timeout elapsed, abandoning connections"
            );
        }
    }

    if let Some(cache) = state.cache() {
        let stats = cache.stats();
        tracing::info!(
            hits = stats.hits,
            misses = stats.misses,
            insertions = stats.insertions,
            evictions = stats.evictions,
            hit_rate = stats.hit_rate(),
            total_bytes = stats.total_bytes,
            "Cache summary"
        );
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
