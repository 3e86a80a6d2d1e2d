// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bubbles-core: domain types for the bubble machine controller
//!
//! This crate provides:
//! - The persisted configuration entity and its invariants
//! - The chat command grammar and authorization levels

pub mod command;
pub mod config;

pub use command::{AuthorizationLevel, BubblesCommand, Chatter, CommandError};
pub use config::{BubblesConfig, ConfigError};
