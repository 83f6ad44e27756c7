//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default User-Agent sent to every origin, replacing whatever the client sent.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3";

/// Root configuration for the forwarding proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, admission limit).
    pub listener: ListenerConfig,

    /// Response cache sizing.
    pub cache: CacheConfig,

    /// Wire-format caps for request parsing and relaying.
    pub limits: LimitsConfig,

    /// How requests to origin servers are rewritten.
    pub origin: OriginConfig,

    /// Optional deadlines.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Bind on all interfaces at `port`, keeping everything else.
    pub fn with_port(mut self, port: u16) -> Self {
        self.listener.bind_address = format!("0.0.0.0:{}", port);
        self
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections. `None` accepts without limit.
    pub max_connections: Option<usize>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: None,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Turn caching off entirely; every request goes to the origin.
    pub enabled: bool,

    /// Number of cache slots.
    pub slots: usize,

    /// Largest response (status line, headers and body) that may be cached.
    pub max_object_size: usize,

    /// Aggregate budget. Tracked and reported, not enforced on insert.
    pub max_cache_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            slots: 10,
            max_object_size: 102_400,
            max_cache_size: 1_049_000,
        }
    }
}

/// Caps applied while reading requests and relaying responses.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Longest single request or header line read in one go.
    pub max_line_length: usize,

    /// Cap on the accumulated raw header block.
    pub max_header_bytes: usize,

    /// Size of each read from the origin.
    pub relay_chunk_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_line_length: 8192,
            max_header_bytes: 8192 * 4,
            relay_chunk_size: 8192,
        }
    }
}

/// Origin request rewriting.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// User-Agent value sent upstream.
    pub user_agent: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Timeout configuration. Absent values mean "wait forever".
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Origin connection establishment timeout in seconds.
    pub connect_secs: Option<u64>,

    /// Per-read idle timeout in seconds, applied to client and origin reads.
    pub idle_secs: Option<u64>,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Option<Duration> {
        self.connect_secs.map(Duration::from_secs)
    }

    pub fn idle(&self) -> Option<Duration> {
        self.idle_secs.map(Duration::from_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
