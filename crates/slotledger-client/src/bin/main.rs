//! slotledger binary: command-line client for slotledger-server

use clap::{Parser, Subcommand};
use serde::Serialize;
use slotledger_client::LedgerClient;
use slotledger_core::HolderId;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "slotledger", about = "Reservation ledger client")]
struct Cli {
    /// Server base URL
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Server health and ledger counters
    Health,
    /// Per-slot status of a room
    Room {
        room: u64,
        /// Unix seconds; defaults to server time
        #[arg(long)]
        timestamp: Option<u64>,
    },
    Reserve {
        room: u64,
        slot: u64,
        timestamp: u64,
        #[arg(long)]
        holder: HolderId,
    },
    Cancel {
        room: u64,
        slot: u64,
        timestamp: u64,
        #[arg(long)]
        holder: HolderId,
    },
    /// Redeem the oldest tokens
    Redeem {
        amount: u128,
        #[arg(long)]
        payment: u128,
    },
    /// Price of redeeming `amount` tokens
    Quote { amount: u128 },
    /// Token count a budget should cover
    Estimate { budget: u128 },
    /// Token word at a ring position
    Token { position: u128 },
    Events {
        #[arg(long, default_value_t = 0)]
        since: u64,
    },
    /// Set room capacity (owner only)
    Capacity {
        room: u64,
        capacity: u64,
        #[arg(long)]
        caller: HolderId,
    },
    /// Enable, disable or relabel a slot (owner only)
    Slot {
        room: u64,
        slot: u64,
        #[arg(long)]
        enabled: Option<bool>,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        caller: HolderId,
    },
    /// Write a snapshot on the server (owner only)
    Snapshot {
        #[arg(long)]
        caller: HolderId,
    },
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = LedgerClient::new(&cli.server);

    match cli.command {
        Command::Health => print(&client.health().await?)?,
        Command::Room { room, timestamp } => print(&client.room(room, timestamp).await?)?,
        Command::Reserve {
            room,
            slot,
            timestamp,
            holder,
        } => {
            let resp = client.reserve(room, slot, timestamp, holder).await?;
            tracing::info!(room, slot, day = resp.day, position = %resp.position, "Reserved");
            print(&resp)?
        }
        Command::Cancel {
            room,
            slot,
            timestamp,
            holder,
        } => print(&client.cancel(room, slot, timestamp, holder).await?)?,
        Command::Redeem { amount, payment } => print(&client.redeem(amount, payment).await?)?,
        Command::Quote { amount } => print(&client.quote(amount).await?)?,
        Command::Estimate { budget } => print(&client.estimate(budget).await?)?,
        Command::Token { position } => print(&client.token(position).await?)?,
        Command::Events { since } => print(&client.events(since).await?)?,
        Command::Capacity {
            room,
            capacity,
            caller,
        } => {
            client.set_capacity(caller, room, capacity).await?;
            eprintln!("Room {} capacity set to {}", room, capacity);
        }
        Command::Slot {
            room,
            slot,
            enabled,
            label,
            caller,
        } => {
            if enabled.is_none() && label.is_none() {
                anyhow::bail!("Nothing to update: pass --enabled and/or --label");
            }
            client
                .update_slot(caller, room, slot, enabled, label.as_deref())
                .await?;
            eprintln!("Room {} slot {} updated", room, slot);
        }
        Command::Snapshot { caller } => print(&client.save_snapshot(caller).await?)?,
    }

    Ok(())
}
