// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! RistoBubbles daemon library: lifecycle, IPC protocol, and socket server

pub mod lifecycle;
pub mod protocol;
pub mod server;

pub use protocol::{ProtocolError, Request, Response};
