//! Forwarding HTTP/1.0 caching proxy library.

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;

pub use cache::ResponseCache;
pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::ProxyServer;
pub use lifecycle::Shutdown;
