// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Bubble machine engine

mod accumulator;
mod controller;
mod error;
mod shutdown;
mod triggers;
mod worker;

pub use accumulator::{
    Accumulator, AccumulatorDeps, AccumulatorStatus, DEFAULT_GRACE_PERIOD,
};
pub use controller::DeviceController;
pub use error::AccumulatorError;
pub use shutdown::{Shutdown, ShutdownSignal};
pub use triggers::{CommandHandler, DonationListener};
