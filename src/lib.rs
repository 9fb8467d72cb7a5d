//! Operations-center protocol gateway
//!
//! A JSON-RPC gateway in front of an operations-center REST API. Clients
//! speak the MCP-flavored protocol (`initialize`, `resources/*`, `tools/*`,
//! `prompts/*`); the gateway authenticates them with a shared bearer token,
//! proxies entity reads and writes upstream with opaque cursor pagination
//! and idempotency keys, and evaluates SLA health locally.

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod health;
pub mod idempotency;
pub mod model;
pub mod protocol;
pub mod registry;
pub mod upstream;

pub use error::{Error, Result};

use cli::LogFormat;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level.
pub fn setup_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("opscenter_gateway={level},tower_http=info")));

    match format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
    }
}
