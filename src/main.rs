//! Reputation gateway CLI.

use anyhow::{Context, Result};
use clap::Parser;
use reputation_gateway::cache::MemoryVerdictStore;
use reputation_gateway::providers::domainrep::DomainReputationProvider;
use reputation_gateway::providers::ipdata::IpdataProvider;
use reputation_gateway::server::{build_router, AppState};
use reputation_gateway::{Config, ReputationResolver};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reputation-gateway")]
#[command(about = "Reputation gateway - cache-fronted IP and domain reputation lookups")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "reputation-gateway.yaml")]
    config: PathBuf,

    /// Listen address (overrides the configured one)
    #[arg(short, long, value_name = "ADDR")]
    listen: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: String,

    /// Print example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --print-config
    if args.print_config {
        println!("{}", Config::example());
        return Ok(());
    }

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load configuration
    info!(config = %args.config.display(), "Loading configuration");
    let config = Config::load(&args.config)?;

    // Handle --validate
    if args.validate {
        info!("Configuration is valid");
        return Ok(());
    }

    if !config.settings.enabled {
        anyhow::bail!("Gateway is disabled in configuration");
    }

    let ipdata_config = config
        .ipdata
        .clone()
        .filter(|c| c.enabled)
        .context("ipdata provider must be configured and enabled")?;
    let domain_config = config
        .domain_reputation
        .clone()
        .filter(|c| c.enabled)
        .context("domain_reputation provider must be configured and enabled")?;

    let store = Arc::new(MemoryVerdictStore::new(config.cache.max_entries));
    let ip_provider = Arc::new(IpdataProvider::new(ipdata_config)?);
    let domain_provider = Arc::new(DomainReputationProvider::new(domain_config)?);

    let resolver = Arc::new(ReputationResolver::new(store, ip_provider, domain_provider));
    let router = build_router(AppState { resolver });

    let addr: SocketAddr = match args.listen {
        Some(addr) => addr,
        None => config.server.listen.parse()?,
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(listen = %addr, "Reputation gateway listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutting down");
}
