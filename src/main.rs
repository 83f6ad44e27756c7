//! Forwarding HTTP/1.0 caching proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │               CACHING PROXY                   │
//!                        │                                               │
//!     Client Request     │  ┌──────────┐    ┌──────────┐   ┌─────────┐   │
//!     ───────────────────┼─▶│   net    │───▶│  http    │──▶│  cache  │   │
//!                        │  │ listener │    │ handler  │   │ lookup  │   │
//!                        │  └──────────┘    └────┬─────┘   └────┬────┘   │
//!                        │                       │ miss         │ hit    │
//!                        │                       ▼              │        │
//!     Client Response    │                 ┌──────────┐         │        │
//!     ◀──────────────────┼─────────────────│  relay   │◀────────┘        │◀──── Origin
//!                        │                 └──────────┘                  │      Server
//!                        │                                               │
//!                        │  config · observability · resilience ·        │
//!                        │  lifecycle                                    │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;

use caching_proxy::config::{load_or_default, validate_config};
use caching_proxy::lifecycle;
use caching_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "caching-proxy")]
#[command(about = "Forwarding HTTP/1.0 proxy with an in-memory response cache", long_about = None)]
struct Cli {
    /// TCP port to listen on (all interfaces)
    port: u16,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Relay every response without caching
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("caching-proxy: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_or_default(cli.config.as_deref())?.with_port(cli.port);
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }
    validate_config(&config).map_err(caching_proxy::config::ConfigError::Validation)?;

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "caching-proxy starting");

    lifecycle::run(config).await?;
    Ok(())
}
