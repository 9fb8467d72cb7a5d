//! Server lifecycle

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::gateway::auth::ResolvedAuthConfig;
use crate::gateway::router::{AppState, create_router};
use crate::registry::Registry;
use crate::upstream::UpstreamClient;
use crate::{Error, Result};

/// The gateway process: owns the registry and the HTTP listener.
pub struct Gateway {
    config: Config,
    state: AppState,
}

impl Gateway {
    /// Wire up the upstream client, registry and authentication gate from
    /// configuration.
    pub fn new(config: Config) -> Result<Self> {
        let upstream = Arc::new(UpstreamClient::new(&config.upstream)?);
        let registry = Arc::new(Registry::new(upstream));
        let auth = Arc::new(ResolvedAuthConfig {
            bearer_token: config.auth.bearer_token.clone(),
            public_paths: config.auth.public_paths.clone(),
        });
        let state = AppState {
            registry,
            auth,
            advertised_url: config.server.advertised_url(),
        };
        Ok(Self { config, state })
    }

    /// Bind the listener and serve until interrupted.
    pub async fn run(self) -> Result<()> {
        let router = create_router(self.state.clone(), &self.config)?;

        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind {addr}: {e}")))?;

        info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            resources = self.state.registry.resources().len(),
            tools = self.state.registry.tools().len(),
            prompts = self.state.registry.prompts().len(),
            "Gateway listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Gateway stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown handler");
    }
}
