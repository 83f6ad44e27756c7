//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Origin connect / client read / origin read:
//!     → timeouts.rs (optional deadline per operation)
//!     → on expiry: ProxyError::TimedOut, connection ends
//! ```
//!
//! # Design Decisions
//! - No retries: a failed origin connection or relay ends that connection only
//! - Deadlines are opt-in through `[timeouts]`

pub mod timeouts;

pub use timeouts::with_deadline;
