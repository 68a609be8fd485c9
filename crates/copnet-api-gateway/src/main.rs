//! # CopNet Gateway
//!
//! Starts one organization's REST gateway over an in-process ledger.
//!
//! ## Startup Sequence
//!
//! 1. Parse command line
//! 2. Install the tracing subscriber (`RUST_LOG`, default `info`)
//! 3. Load configuration (TOML file, then `COPNET_*` environment)
//! 4. Build the contract service and ledger network adapter
//! 5. Serve until Ctrl+C

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use copnet_api_gateway::{ApiGatewayService, GatewayConfig, InProcessNetwork};
use copnet_paper_contract::prelude::{InMemoryLedger, PaperContractService, ServiceConfig};

#[derive(Parser, Debug)]
#[command(name = "copnet-gateway")]
#[command(about = "REST gateway for the VDX paper contract", version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP port, overriding the file and COPNET_HTTP_PORT
    #[arg(short, long)]
    port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs)?;

    let mut config =
        GatewayConfig::load(args.config.as_deref()).context("loading gateway configuration")?;
    if let Some(port) = args.port {
        config.http.port = port;
    }

    let service = PaperContractService::new(InMemoryLedger::new(), ServiceConfig::default())
        .context("building contract service")?;
    let network = InProcessNetwork::from_config(Arc::new(service), &config);
    info!(
        organization = %config.organization.name,
        channel = %config.network.channel,
        contract = %config.network.contract,
        "connected to ledger network"
    );

    let gateway = ApiGatewayService::new(config, Arc::new(network))?;
    gateway
        .start(async {
            // Keep the gateway running
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal");
        })
        .await?;

    Ok(())
}
