// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network switch adapters for the bubble machine

mod http;

pub use http::{HttpDeviceAdapter, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SWITCH_NAME};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{DeviceCall, DeviceOp, FakeDeviceAdapter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from switch operations
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("switch returned HTTP {0}")]
    Status(u16),
    #[error("request to switch failed: {0}")]
    Transport(String),
    #[error("unexpected response from switch: {0}")]
    InvalidResponse(String),
    #[error("request task failed: {0}")]
    Task(String),
}

/// State document returned by a switch query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchState {
    pub id: String,
    /// Whether the switch is on
    pub value: bool,
    /// Human-readable state, e.g. "ON"
    pub state: String,
}

/// Adapter for a remote on/off switch
#[async_trait]
pub trait DeviceAdapter: Clone + Send + Sync + 'static {
    /// Turn the switch on or off
    async fn set_state(&self, on: bool) -> Result<(), DeviceError>;

    /// Flip the switch
    async fn toggle(&self) -> Result<(), DeviceError>;

    /// Query the switch
    async fn state(&self) -> Result<SwitchState, DeviceError>;
}
