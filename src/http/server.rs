//! Proxy server setup and accept loop.
//!
//! # Responsibilities
//! - Build the shared state (cache, limits, origin settings) once at startup
//! - Accept client connections until shutdown
//! - Hand each connection to a detached worker task
//! - Log and count every connection's outcome
//!
//! # Design Decisions
//! - Workers are never joined; the connection tracker observes them instead
//! - One connection's failure never reaches the accept loop

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::cache::ResponseCache;
use crate::config::{LimitsConfig, OriginConfig, ProxyConfig, TimeoutConfig};
use crate::http::handler::serve_connection;
use crate::net::{ConnectionGuard, ConnectionPermit, ConnectionTracker, Listener};
use crate::observability::metrics;

/// Pause after a failed accept so descriptor exhaustion does not spin the loop.
const ACCEPT_ERROR_PAUSE: Duration = Duration::from_millis(10);

/// State shared by every worker.
#[derive(Debug)]
pub struct ProxyState {
    cache: Option<ResponseCache>,
    pub limits: LimitsConfig,
    pub origin: OriginConfig,
    pub timeouts: TimeoutConfig,
}

impl ProxyState {
    pub fn from_config(config: &ProxyConfig) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| ResponseCache::from_config(&config.cache));

        Self {
            cache,
            limits: config.limits.clone(),
            origin: config.origin.clone(),
            timeouts: config.timeouts.clone(),
        }
    }

    /// The response cache, or `None` when caching is switched off.
    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }
}

/// Forwarding proxy server.
pub struct ProxyServer {
    state: Arc<ProxyState>,
    tracker: ConnectionTracker,
}

impl ProxyServer {
    pub fn new(config: &ProxyConfig) -> Self {
        Self {
            state: Arc::new(ProxyState::from_config(config)),
            tracker: ConnectionTracker::new(),
        }
    }

    /// Shared handle to the worker state.
    pub fn state(&self) -> Arc<ProxyState> {
        Arc::clone(&self.state)
    }

    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Accept connections until `shutdown` fires.
    ///
    /// Returns once the loop stops accepting; workers still running are
    /// left to the caller to drain through [`ProxyServer::tracker`].
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            cache_enabled = self.state.cache().is_some(),
            "Proxy server starting"
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => self.dispatch(stream, peer, permit),
                    Err(e) => {
                        tracing::error!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_PAUSE).await;
                    }
                },
            }
        }

        tracing::info!(
            active_connections = self.tracker.active_count(),
            "Proxy server stopped"
        );
        Ok(())
    }

    fn dispatch(&self, stream: TcpStream, peer: SocketAddr, permit: Option<ConnectionPermit>) {
        let state = Arc::clone(&self.state);
        let guard = self.tracker.track();

        tokio::spawn(async move {
            let _permit = permit;
            handle_connection(stream, peer, state, guard).await;
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ProxyState>,
    guard: ConnectionGuard,
) {
    let started = Instant::now();
    let span = tracing::info_span!("connection", connection_id = %guard.id(), peer_addr = %peer);

    async move {
        match serve_connection(stream, &state).await {
            Ok(outcome) => {
                tracing::debug!(
                    outcome = outcome.label(),
                    bytes = outcome.bytes(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Connection finished"
                );
                metrics::record_request(outcome.label(), started);
            }
            Err(e) if e.is_client_gone() => {
                tracing::debug!(error = %e, "Client went away");
                metrics::record_request(e.kind(), started);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Connection failed");
                metrics::record_request(e.kind(), started);
            }
        }
        drop(guard);
    }
    .instrument(span)
    .await
}
