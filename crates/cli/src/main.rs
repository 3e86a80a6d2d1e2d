// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bubbles - RistoBubbles CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{chat, device, donate};

use crate::client::{daemon_stop, DaemonClient};

#[derive(Parser)]
#[command(
    name = "bubbles",
    version,
    about = "RistoBubbles - stream-triggered bubble machine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a chat line through the command handler
    Chat(chat::ChatArgs),
    /// Report a donation
    Donate(donate::DonateArgs),
    /// Show daemon and accumulator status
    Status,
    /// Talk to the switch directly
    Device {
        #[command(subcommand)]
        command: device::DeviceCommand,
    },
    /// Stop the daemon, leaving the machine off
    Shutdown,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat(args) => chat::handle(args).await?,
        Commands::Donate(args) => donate::handle(args).await?,
        Commands::Device { command } => device::handle(command).await?,

        Commands::Status => {
            let client = match DaemonClient::connect() {
                Ok(client) => client,
                Err(client::ClientError::DaemonNotRunning) => {
                    println!("Daemon not running");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            let version = client.hello().await?;
            let status = client.status().await?;
            println!("Daemon: running (v{}, up {}s)", version, status.uptime_secs);
            println!(
                "  Bubbles: {}",
                if status.enabled { "enabled" } else { "disabled" }
            );
            println!("  Active: {}", if status.active { "yes" } else { "no" });
            println!("  Blast duration: {}s", status.blast_duration);
            println!("  Donation threshold: {}", status.donation_threshold);
        }

        Commands::Shutdown => {
            if daemon_stop().await? {
                println!("Daemon stopped");
            } else {
                println!("Daemon not running");
            }
        }
    }

    Ok(())
}
