use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use opscenter_gateway::cli::Cli;
use opscenter_gateway::config::Config;
use opscenter_gateway::gateway::Gateway;
use opscenter_gateway::setup_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before clap resolves env-backed arguments.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    setup_tracing(&cli.log_level, cli.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> opscenter_gateway::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    Gateway::new(config)?.run().await
}
