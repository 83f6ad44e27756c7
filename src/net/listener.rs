//! TCP listener implementation with optional admission limit.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Enforce `max_connections` via semaphore when configured
//!
//! # Design Decisions
//! - Unbounded by default: every accepted connection gets its own worker
//! - With a limit, accepts wait for a free slot instead of refusing

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    Bind(#[source] std::io::Error),
    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(#[source] std::io::Error),
}

/// A TCP listener that can optionally bound concurrent connections.
pub struct Listener {
    inner: TcpListener,
    connection_limit: Option<Arc<Semaphore>>,
}

impl Listener {
    /// Bind to the configured address.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
            ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            max_connections = ?config.max_connections,
            "Listener bound"
        );

        Ok(Self::from_tcp(listener, config.max_connections))
    }

    /// Wrap an already bound socket.
    pub fn from_tcp(inner: TcpListener, max_connections: Option<usize>) -> Self {
        Self {
            inner,
            connection_limit: max_connections.map(|max| Arc::new(Semaphore::new(max))),
        }
    }

    /// Accept a new connection, waiting for a slot first when a limit is set.
    ///
    /// The returned permit (if any) must live as long as the connection.
    pub async fn accept(
        &self,
    ) -> Result<(TcpStream, SocketAddr, Option<ConnectionPermit>), ListenerError> {
        let permit = match &self.connection_limit {
            // The semaphore is never closed, so acquire cannot fail.
            Some(limit) => Arc::clone(limit)
                .acquire_owned()
                .await
                .ok()
                .map(|permit| ConnectionPermit { _permit: permit }),
            None => None,
        };

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = ?self.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, permit))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    /// Free connection slots, or `None` when unbounded.
    pub fn available_permits(&self) -> Option<usize> {
        self.connection_limit
            .as_ref()
            .map(|limit| limit.available_permits())
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the connection slot is released back to the pool.
/// This keeps the limit intact even if the connection handler panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(max_connections: Option<usize>) -> ListenerConfig {
        ListenerConfig {
            bind_address: "127.0.0.1:0".into(),
            max_connections,
        }
    }

    #[tokio::test]
    async fn bind_rejects_bad_address() {
        let mut bad = config(None);
        bad.bind_address = "nope".into();
        assert!(matches!(Listener::bind(&bad).await, Err(ListenerError::Bind(_))));
    }

    #[tokio::test]
    async fn unbounded_listener_has_no_permits() {
        let listener = Listener::bind(&config(None)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let _client = TcpStream::connect(addr).await.unwrap();
        let (_stream, _peer, permit) = listener.accept().await.unwrap();
        assert!(permit.is_none());
        assert_eq!(listener.available_permits(), None);
    }

    #[tokio::test]
    async fn limit_holds_until_permit_dropped() {
        let listener = Listener::bind(&config(Some(1))).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let _c1 = TcpStream::connect(addr).await.unwrap();
        let _c2 = TcpStream::connect(addr).await.unwrap();

        let (_s1, _, permit) = listener.accept().await.unwrap();
        assert!(permit.is_some());
        assert_eq!(listener.available_permits(), Some(0));

        // Second accept must wait while the first permit is held
        let blocked = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
        assert!(blocked.is_err());

        drop(permit);
        let (_s2, _, permit2) = tokio::time::timeout(Duration::from_secs(2), listener.accept())
            .await
            .expect("accept after release")
            .unwrap();
        assert!(permit2.is_some());
    }
}
