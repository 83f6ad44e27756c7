//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → CLI overrides (port, log level, --no-cache)
//!     → copied into the per-connection state shared by workers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    CacheConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, OriginConfig, ProxyConfig,
    TimeoutConfig, DEFAULT_USER_AGENT,
};
pub use validation::{validate_config, ValidationError};
