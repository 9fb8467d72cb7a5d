//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

/// Operations-center protocol gateway
#[derive(Debug, Parser)]
#[command(name = "opscenter-gateway", version, about)]
pub struct Cli {
    /// Path to a YAML configuration file
    #[arg(short, long, env = "OPS_GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Host to bind to (overrides configuration)
    #[arg(long, env = "OPS_GATEWAY_HOST")]
    pub host: Option<String>,

    /// Port to listen on (overrides configuration)
    #[arg(short, long, env = "OPS_GATEWAY_PORT")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "OPS_GATEWAY_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, env = "OPS_GATEWAY_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text
    Text,
    /// Structured JSON lines
    Json,
}
