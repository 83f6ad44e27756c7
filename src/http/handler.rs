//! Per-connection worker.
//!
//! ```text
//! ReadRequestLine → ReadHeaders → ResolveURI → CacheLookup
//!     hit:  WriteClientFromCache → Done
//!     miss: ConnectOrigin → SendOriginRequest → RelayResponse → MaybeCacheInsert → Done
//! ```
//!
//! Any I/O failure ends the connection early. Only a non-GET method (501)
//! and an unreachable origin (502) get a locally generated response.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::cache::InsertOutcome;
use crate::error::ProxyError;
use crate::http::headers::read_headers;
use crate::http::rebuild::rebuild_request;
use crate::http::request::{read_line, RequestLine};
use crate::http::response;
use crate::http::server::ProxyState;
use crate::http::uri::{self, Target};
use crate::observability::metrics;
use crate::resilience::with_deadline;

/// How a successfully served connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Answered from the cache without contacting the origin.
    CacheHit { bytes: usize },
    /// Relayed from the origin. `cache` is `None` when caching is off or the
    /// origin sent nothing.
    Relayed {
        bytes: usize,
        cache: Option<InsertOutcome>,
    },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::CacheHit { .. } => "cache_hit",
            Outcome::Relayed { .. } => "relayed",
        }
    }

    pub fn bytes(&self) -> usize {
        match self {
            Outcome::CacheHit { bytes } | Outcome::Relayed { bytes, .. } => *bytes,
        }
    }
}

/// Serve one client connection to completion.
pub async fn serve_connection<S>(client: S, state: &ProxyState) -> Result<Outcome, ProxyError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut writer) = tokio::io::split(client);
    let mut reader = BufReader::new(read_half);
    let limits = &state.limits;
    let idle = state.timeouts.idle();

    let line = with_deadline(
        idle,
        "reading request line",
        read_line(&mut reader, limits.max_line_length),
    )
    .await?
    .map_err(|_| ProxyError::ConnectionClosed)?;
    if line.is_empty() {
        return Err(ProxyError::ConnectionClosed);
    }

    let request = RequestLine::parse(&line);
    debug!(
        method = %request.method,
        uri = %request.target,
        version = %request.version,
        "Request line"
    );

    if !request.is_get() {
        reply_error(&mut writer, &response::not_implemented(&request.method)).await;
        return Err(ProxyError::UnsupportedMethod(request.method));
    }
    if !request.is_well_formed() {
        warn!(
            line = %String::from_utf8_lossy(&line).trim_end(),
            "Malformed request line, continuing"
        );
    }

    let headers = with_deadline(
        idle,
        "reading request headers",
        read_headers(&mut reader, limits.max_line_length, limits.max_header_bytes),
    )
    .await??;

    let target = uri::resolve(&request.target, headers.host_line.as_deref());
    debug!(host = %target.host, port = target.port, path = %target.path, "Resolved target");

    if let Some(cache) = state.cache() {
        let hit = cache.lookup(&request.target);
        metrics::record_cache_lookup(hit.is_some());
        if let Some(payload) = hit {
            write_client(&mut writer, &payload).await?;
            finish(&mut writer).await;
            info!(uri = %request.target, bytes = payload.len(), "Served from cache");
            return Ok(Outcome::CacheHit {
                bytes: payload.len(),
            });
        }
    }

    let mut origin = match connect_origin(&target, state).await {
        Ok(origin) => origin,
        Err(e) => {
            reply_error(&mut writer, &response::bad_gateway(&target.host)).await;
            return Err(e);
        }
    };

    let outgoing = rebuild_request(&target, &headers.raw, &state.origin.user_agent);
    origin
        .write_all(outgoing.as_bytes())
        .await
        .map_err(ProxyError::OriginIo)?;

    // Caching is abandoned, not the relay, once the response outgrows the cap.
    let cache = state.cache();
    let mut candidate = cache.map(|_| Vec::new());
    let mut chunk = vec![0u8; limits.relay_chunk_size];
    let mut relayed = 0usize;

    loop {
        let n = with_deadline(idle, "reading origin response", origin.read(&mut chunk))
            .await?
            .map_err(ProxyError::OriginIo)?;
        if n == 0 {
            break;
        }

        write_client(&mut writer, &chunk[..n]).await?;
        relayed += n;

        if let Some(cache) = cache {
            candidate = candidate.take().and_then(|mut buffer| {
                if cache.admits(buffer.len() + n) {
                    buffer.extend_from_slice(&chunk[..n]);
                    Some(buffer)
                } else {
                    None
                }
            });
        }
    }
    metrics::record_bytes_relayed(relayed);

    let cache_outcome = match (cache, candidate) {
        (Some(cache), Some(buffer)) if !buffer.is_empty() => {
            Some(cache.insert(request.target.clone(), buffer))
        }
        (Some(cache), None) => Some(cache.skip_oversized(relayed)),
        _ => None,
    };
    if let Some(outcome) = &cache_outcome {
        metrics::record_cache_insert(outcome);
        debug!(uri = %request.target, ?outcome, "Cache insert");
    }
    // Close only after the insert so a follow-up request sees the entry.
    finish(&mut writer).await;

    info!(uri = %request.target, origin = %target, bytes = relayed, "Relayed from origin");
    Ok(Outcome::Relayed {
        bytes: relayed,
        cache: cache_outcome,
    })
}

async fn connect_origin(target: &Target, state: &ProxyState) -> Result<TcpStream, ProxyError> {
    let connect = TcpStream::connect((target.host.as_str(), target.port));
    let deadline = with_deadline(state.timeouts.connect(), "connecting to origin", connect);
    let result = deadline
        .await
        .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out")));

    result.map_err(|source| ProxyError::OriginUnreachable {
        host: target.host.clone(),
        port: target.port,
        source,
    })
}

async fn write_client<W>(writer: &mut W, bytes: &[u8]) -> Result<(), ProxyError>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(bytes)
        .await
        .map_err(ProxyError::WriteFailure)
}

/// Best-effort error page; the connection is ending either way.
async fn reply_error<W>(writer: &mut W, bytes: &[u8])
where
    W: AsyncWrite + Unpin,
{
    if let Err(e) = write_client(writer, bytes).await {
        debug!(error = %e, "Could not deliver error response");
    }
    finish(writer).await;
}

async fn finish<W>(writer: &mut W)
where
    W: AsyncWrite + Unpin,
{
    let _ = writer.shutdown().await;
}
