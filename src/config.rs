//! Configuration management
//!
//! Built once at startup and handed to each component; nothing reads
//! configuration ad hoc from global state after that.

use std::{env, path::Path};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener configuration
    pub server: ServerConfig,
    /// Authentication gate configuration
    pub auth: AuthConfig,
    /// Upstream REST API configuration
    pub upstream: UpstreamConfig,
    /// CORS configuration
    pub cors: CorsConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Externally visible base URL, advertised by the discovery endpoint.
    /// Falls back to `http://{host}:{port}` when unset.
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            public_url: None,
        }
    }
}

impl ServerConfig {
    /// The base URL advertised to clients.
    #[must_use]
    pub fn advertised_url(&self) -> String {
        self.public_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host, self.port))
    }
}

/// Authentication gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared bearer secret protected endpoints must present
    pub bearer_token: String,
    /// Paths that bypass authentication. `/` matches exactly; other entries
    /// match by prefix.
    pub public_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bearer_token: "dev-token".to_string(),
            public_paths: vec![
                "/".to_string(),
                "/api/discovery".to_string(),
                "/api/mcp-status".to_string(),
            ],
        }
    }
}

/// Upstream REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the operations-center REST API
    pub base_url: String,
    /// Bearer token presented to the upstream on every call
    pub token: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://mock.local/api/v1".to_string(),
            token: "dev-token".to_string(),
            timeout_secs: 30,
        }
    }
}

/// CORS configuration
///
/// Permissive by default so browser-based clients work out of the box;
/// production deployments set `allowed_origin` to a specific origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Specific origin to allow. `None` allows any origin.
    pub allowed_origin: Option<String>,
}

impl Config {
    /// Load configuration: optional YAML file, then `OPS_GATEWAY_*`
    /// environment variables, then the legacy deployment variable names
    /// (`OC_API_BASE_URL`, `BEARER_TOKEN`, `PORT`) on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed("OPS_GATEWAY_").split("__"));

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.apply_legacy_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply the environment variable names the original deployment used.
    /// `BEARER_TOKEN` configures both the gate secret and the upstream
    /// credential, matching the single shared secret of that deployment.
    fn apply_legacy_env(&mut self) {
        if let Ok(base_url) = env::var("OC_API_BASE_URL") {
            self.upstream.base_url = base_url;
        }
        if let Ok(token) = env::var("BEARER_TOKEN") {
            self.auth.bearer_token = token.clone();
            self.upstream.token = token;
        }
        if let Ok(port) = env::var("PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(port, "Ignoring unparseable PORT"),
            }
        }
    }

    /// Reject configurations that cannot produce a working gateway.
    fn validate(&self) -> Result<()> {
        if self.auth.bearer_token.is_empty() {
            return Err(Error::Config("bearer token must not be empty".to_string()));
        }
        url::Url::parse(&self.upstream.base_url)
            .map_err(|e| Error::Config(format!("invalid upstream base URL: {e}")))?;
        if self.upstream.timeout_secs == 0 {
            return Err(Error::Config("upstream timeout must be positive".to_string()));
        }
        Ok(())
    }
}
