// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger sources: chat commands and donations

use crate::accumulator::Accumulator;
use bubbles_adapters::DeviceAdapter;
use bubbles_core::{BubblesCommand, Chatter, CommandError};
use std::sync::Arc;

/// Turns moderator chat commands into accumulator calls
pub struct CommandHandler<D> {
    accumulator: Arc<Accumulator<D>>,
}

impl<D: DeviceAdapter> CommandHandler<D> {
    pub fn new(accumulator: Arc<Accumulator<D>>) -> Self {
        Self { accumulator }
    }

    /// Handle one chat message. Returns the reply to post, if any.
    ///
    /// Messages that are not bubble commands are ignored without a reply.
    pub async fn handle(&self, chatter: &Chatter, text: &str) -> Option<String> {
        let parsed = match bubbles_core::command::parse(text) {
            Ok(None) => return None,
            other => other,
        };
        let user = &chatter.user_name;

        if !chatter.can_control_bubbles() {
            tracing::info!(user = %user, level = %chatter.level, "unauthorized bubble command");
            return Some(format!("I'm afraid I can't let you do that, @{user}."));
        }

        let command = match parsed {
            Ok(Some(command)) => command,
            Ok(None) => return None,
            Err(CommandError::InvalidSetArgument) => {
                return Some(format!(
                    "@{user}, Error using !set bubbles command. \
                     Expected !set bubbles enabled or !set bubbles disabled."
                ));
            }
            Err(CommandError::InvalidActivateArgument) => {
                return Some(format!(
                    "@{user}, Error using !activate bubbles command. \
                     Expected !activate bubbles or !activate bubbles 10."
                ));
            }
            Err(e) => return Some(format!("@{user}, {e}")),
        };

        tracing::info!(user = %user, ?command, "bubble command");
        match command {
            BubblesCommand::Stop => {
                self.accumulator.stop().await;
                None
            }
            BubblesCommand::SetEnabled(enabled) => {
                if self.accumulator.enabled() == enabled {
                    let word = if enabled { "Enabled" } else { "Disabled" };
                    return Some(format!("@{user}, RistoBubbles are already {word}."));
                }
                self.accumulator.set_enabled(enabled);
                None
            }
            BubblesCommand::Activate { seconds } => {
                if !self.accumulator.add_duration(seconds) {
                    tracing::debug!(user = %user, seconds, "activate rejected by accumulator");
                }
                None
            }
        }
    }
}

/// Fires a blast for donations at or above the configured threshold
pub struct DonationListener<D> {
    accumulator: Arc<Accumulator<D>>,
}

impl<D: DeviceAdapter> DonationListener<D> {
    pub fn new(accumulator: Arc<Accumulator<D>>) -> Self {
        Self { accumulator }
    }

    /// Returns whether the donation queued a blast
    pub fn notify_donation(&self, name: &str, amount: f64, message: &str) -> bool {
        let config = self.accumulator.config().snapshot();
        if !config.meets_donation_threshold(amount) {
            tracing::debug!(
                name,
                amount,
                threshold = config.donation_threshold,
                "donation below threshold"
            );
            return false;
        }
        tracing::info!(name, amount, message, "donation over threshold");
        self.accumulator.add_duration(config.blast_duration)
    }
}

#[cfg(test)]
#[path = "triggers_tests.rs"]
mod tests;
