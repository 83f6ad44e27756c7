//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Listener, workers and cache produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber, filtered by RUST_LOG or config)
//!     → Metrics endpoint (Prometheus scrape, opt-in)
//! ```
//!
//! # Design Decisions
//! - Every connection runs inside a span carrying its id and peer
//! - Metrics are cheap (atomic increments) and off by default

pub mod logging;
pub mod metrics;
