//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, one detached worker per connection)
//!     → request.rs / headers.rs (request line and header block)
//!     → uri.rs (origin host, port, path)
//!     → cache lookup, or rebuild.rs (HTTP/1.0 origin request)
//!     → handler.rs (relay origin bytes, maybe cache them)
//!     → response.rs (local 501/502 pages)
//! ```

pub mod handler;
pub mod headers;
pub mod rebuild;
pub mod request;
pub mod response;
pub mod server;
pub mod uri;

pub use handler::{serve_connection, Outcome};
pub use server::{ProxyServer, ProxyState};
pub use uri::{resolve, Target};
