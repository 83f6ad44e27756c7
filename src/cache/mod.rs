//! Cache Module
//!
//! Fixed-capacity response cache keyed by request URI, shared by all
//! connection workers.
//!
//! # Data Flow
//! ```text
//! worker: lookup(uri)
//!     → lock, scan occupied slots, bump clock, copy payload, unlock
//!     → hit: write copy to client
//!     → miss: relay from origin, buffer up to max_object_size
//!         → insert(uri, buffer): free slot, else overwrite min last_use
//! ```

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::{InsertOutcome, ResponseCache, SkipReason, SlotView};
