// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Donate command: report a donation to the threshold listener

use anyhow::{bail, Result};

use crate::client::DaemonClient;

#[derive(clap::Args)]
pub struct DonateArgs {
    /// Donation amount
    pub amount: f64,

    /// Donor name
    #[arg(long, default_value = "anonymous")]
    pub name: String,

    /// Donation message
    #[arg(long, default_value = "")]
    pub message: String,
}

pub async fn handle(args: DonateArgs) -> Result<()> {
    if !args.amount.is_finite() || args.amount < 0.0 {
        bail!("donation amount must be a non-negative number");
    }

    let client = DaemonClient::connect_or_start().await?;
    if client.donate(&args.name, args.amount, &args.message).await? {
        println!("Donation of {} from {} triggered bubbles", args.amount, args.name);
    } else {
        println!("Donation of {} from {} recorded", args.amount, args.name);
    }
    Ok(())
}
