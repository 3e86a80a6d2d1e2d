// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device diagnostics, answered by the switch itself

use anyhow::Result;
use clap::Subcommand;

use crate::client::DaemonClient;

#[derive(Subcommand)]
pub enum DeviceCommand {
    /// Query whether the switch is on
    State,
    /// Flip the switch directly, bypassing the queue
    Toggle,
}

pub async fn handle(command: DeviceCommand) -> Result<()> {
    let client = DaemonClient::connect_or_start().await?;
    match command {
        DeviceCommand::State => match client.device_state().await? {
            Some(true) => println!("Switch: ON"),
            Some(false) => println!("Switch: OFF"),
            None => println!("Switch: unknown (unreachable)"),
        },
        DeviceCommand::Toggle => {
            client.toggle().await?;
            println!("Switch toggled");
        }
    }
    Ok(())
}
