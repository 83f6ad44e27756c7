//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, optional connection limit)
//!     → connection.rs (id assignment, active-connection tracking)
//!     → Hand off to a detached worker in the HTTP layer
//! ```
//!
//! # Design Decisions
//! - One task per connection, never joined by the accept loop
//! - Admission control is opt-in; the default is unbounded

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{ConnectionPermit, Listener, ListenerError};
