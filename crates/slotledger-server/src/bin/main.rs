//! slotledger-server binary

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use slotledger_core::{HolderId, LedgerConfig};
use slotledger_server::ServerBuilder;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "slotledger-server", about = "Reservation ledger HTTP server")]
struct Args {
    /// Ledger config (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Owner identity, overriding the config file
    #[arg(long)]
    owner: Option<HolderId>,

    /// Snapshot file, overriding the config file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    #[arg(long, default_value_t = 3000)]
    port: u16,

    /// Serve Prometheus metrics on /metrics
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => LedgerConfig::load(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(owner) = args.owner {
        config.owner = owner;
    }
    if let Some(snapshot) = args.snapshot {
        config.snapshot_path = Some(snapshot);
    }

    let server = ServerBuilder::new(config)
        .addr((args.bind, args.port).into())
        .with_prometheus(args.metrics)
        .build()
        .await?;

    tracing::info!(addr = %server.addr(), "Server ready");
    server.run().await?;

    Ok(())
}
