// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bubble machine configuration entity
//!
//! Field names on disk match the JSON the bot has always written, so an
//! existing `RistoBubblesConfig.json` loads without migration.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default host of the bubble machine switch
pub const DEFAULT_DEVICE_ADDRESS: &str = "192.168.20.142";
/// Default donation amount that triggers a blast
pub const DEFAULT_DONATION_THRESHOLD: f64 = 5.0;
/// Default blast length in seconds
pub const DEFAULT_BLAST_DURATION: f64 = 10.0;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("blast duration must be a positive number of seconds, got {0}")]
    InvalidBlastDuration(f64),
    #[error("donation threshold must be zero or more, got {0}")]
    InvalidDonationThreshold(f64),
    #[error("device address must not be empty")]
    EmptyDeviceAddress,
}

/// Persisted bubble machine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BubblesConfig {
    #[serde(rename = "Enabled")]
    pub enabled: bool,
    /// Host or IP of the switch, without scheme
    #[serde(rename = "RistoBubblesMachine")]
    pub device_address: String,
    #[serde(rename = "DonationThreshold")]
    pub donation_threshold: f64,
    /// Seconds added per trigger
    #[serde(rename = "BlastDuration")]
    pub blast_duration: f64,
}

impl Default for BubblesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device_address: DEFAULT_DEVICE_ADDRESS.to_string(),
            donation_threshold: DEFAULT_DONATION_THRESHOLD,
            blast_duration: DEFAULT_BLAST_DURATION,
        }
    }
}

impl BubblesConfig {
    /// Check the invariants a running accumulator relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.blast_duration.is_finite() || self.blast_duration <= 0.0 {
            return Err(ConfigError::InvalidBlastDuration(self.blast_duration));
        }
        // The worker turns each blast into a deadline on the monotonic clock
        let deadline = Duration::try_from_secs_f64(self.blast_duration)
            .ok()
            .and_then(|length| Instant::now().checked_add(length));
        if deadline.is_none() {
            return Err(ConfigError::InvalidBlastDuration(self.blast_duration));
        }
        if self.donation_threshold.is_nan() || self.donation_threshold < 0.0 {
            return Err(ConfigError::InvalidDonationThreshold(
                self.donation_threshold,
            ));
        }
        if self.device_address.trim().is_empty() {
            return Err(ConfigError::EmptyDeviceAddress);
        }
        Ok(())
    }

    /// Whether a donation of `amount` should trigger a blast
    pub fn meets_donation_threshold(&self, amount: f64) -> bool {
        amount >= self.donation_threshold
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
