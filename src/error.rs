//! Error taxonomy for the proxy core.
//!
//! Every variant is scoped to a single client connection. None of them stop
//! the accept loop; the server logs the error and moves on.

use std::io;

use thiserror::Error;

/// Failure of a single proxied connection.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The client went away (EOF or read error) before a full request arrived.
    /// No response is written.
    #[error("client closed the connection before sending a complete request")]
    ConnectionClosed,

    /// Anything other than `GET`. Answered with `501 Not Implemented`.
    #[error("method `{0}` is not implemented")]
    UnsupportedMethod(String),

    /// TCP connect to the resolved origin failed. Answered with `502 Bad Gateway`.
    #[error("cannot reach origin {host}:{port}: {source}")]
    OriginUnreachable {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// Sending the rebuilt request or reading the response from the origin failed.
    #[error("origin i/o failed: {0}")]
    OriginIo(#[source] io::Error),

    /// The client disconnected while we were writing to it.
    #[error("write to client failed: {0}")]
    WriteFailure(#[source] io::Error),

    /// A configured connect or idle deadline elapsed.
    #[error("timed out while {0}")]
    TimedOut(&'static str),
}

impl ProxyError {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::ConnectionClosed => "connection_closed",
            ProxyError::UnsupportedMethod(_) => "unsupported_method",
            ProxyError::OriginUnreachable { .. } => "origin_unreachable",
            ProxyError::OriginIo(_) => "origin_io",
            ProxyError::WriteFailure(_) => "write_failure",
            ProxyError::TimedOut(_) => "timed_out",
        }
    }

    /// Whether this is an ordinary client-side hangup rather than a fault worth a warning.
    pub fn is_client_gone(&self) -> bool {
        matches!(
            self,
            ProxyError::ConnectionClosed | ProxyError::WriteFailure(_)
        )
    }
}
