// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chat command: post a line as if it came from stream chat

use anyhow::Result;
use bubbles_core::AuthorizationLevel;

use crate::client::DaemonClient;

#[derive(clap::Args)]
pub struct ChatArgs {
    /// Chatter name used in replies
    #[arg(long, default_value = "operator")]
    pub user: String,

    /// Authorization level (none, restricted, elevated, moderator, admin)
    #[arg(long, default_value = "moderator")]
    pub level: AuthorizationLevel,

    /// Chat text, e.g. `!activate bubbles`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub text: Vec<String>,
}

pub async fn handle(args: ChatArgs) -> Result<()> {
    let client = DaemonClient::connect_or_start().await?;
    let text = args.text.join(" ");

    match client.chat(&args.user, args.level, &text).await? {
        Some(reply) => println!("{}", reply),
        None => println!("(no reply)"),
    }
    Ok(())
}
