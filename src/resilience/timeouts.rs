//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap origin connect and individual reads with an optional deadline
//! - Keep "no deadline" the default, matching blocking-socket behavior
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - A connect timeout is answered like any other connect failure (502)

use std::future::Future;
use std::time::Duration;

use crate::error::ProxyError;

/// Await `fut`, failing with [`ProxyError::TimedOut`] once `limit` elapses.
/// `None` waits forever.
pub async fn with_deadline<F, T>(
    limit: Option<Duration>,
    during: &'static str,
    fut: F,
) -> Result<T, ProxyError>
where
    F: Future<Output = T>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ProxyError::TimedOut(during)),
        None => Ok(fut.await),
    }
}
