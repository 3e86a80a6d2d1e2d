// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake switch adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{DeviceAdapter, DeviceError, SwitchState};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Operation sent to the fake switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOp {
    TurnOn,
    TurnOff,
    Toggle,
    GetState,
}

/// Recorded switch call, stamped with tokio time so paused-clock tests can
/// assert on exact timings
#[derive(Debug, Clone)]
pub struct DeviceCall {
    pub op: DeviceOp,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct FakeSwitch {
    on: bool,
    failing: bool,
    latency: Duration,
}

/// Fake switch adapter for testing
#[derive(Clone, Default)]
pub struct FakeDeviceAdapter {
    switch: Arc<Mutex<FakeSwitch>>,
    calls: Arc<Mutex<Vec<DeviceCall>>>,
}

impl FakeDeviceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Recorded operations without timestamps
    pub fn ops(&self) -> Vec<DeviceOp> {
        self.calls().into_iter().map(|c| c.op).collect()
    }

    /// Number of recorded calls of one kind
    pub fn count(&self, op: DeviceOp) -> usize {
        self.calls().iter().filter(|c| c.op == op).count()
    }

    /// Current simulated switch position
    pub fn is_on(&self) -> bool {
        self.switch.lock().unwrap_or_else(|e| e.into_inner()).on
    }

    /// Make every subsequent call fail as if the network were down
    pub fn set_failing(&self, failing: bool) {
        self.switch.lock().unwrap_or_else(|e| e.into_inner()).failing = failing;
    }

    /// Delay every subsequent call by `latency` (tokio time)
    pub fn set_latency(&self, latency: Duration) {
        self.switch.lock().unwrap_or_else(|e| e.into_inner()).latency = latency;
    }

    /// Record the call, then apply latency and failure settings
    async fn begin(&self, op: DeviceOp) -> Result<(), DeviceError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(DeviceCall {
                op,
                at: Instant::now(),
            });

        let (latency, failing) = {
            let switch = self.switch.lock().unwrap_or_else(|e| e.into_inner());
            (switch.latency, switch.failing)
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if failing {
            return Err(DeviceError::Transport("fake switch unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceAdapter for FakeDeviceAdapter {
    async fn set_state(&self, on: bool) -> Result<(), DeviceError> {
        self.begin(if on { DeviceOp::TurnOn } else { DeviceOp::TurnOff })
            .await?;
        self.switch.lock().unwrap_or_else(|e| e.into_inner()).on = on;
        Ok(())
    }

    async fn toggle(&self) -> Result<(), DeviceError> {
        self.begin(DeviceOp::Toggle).await?;
        let mut switch = self.switch.lock().unwrap_or_else(|e| e.into_inner());
        switch.on = !switch.on;
        Ok(())
    }

    async fn state(&self) -> Result<SwitchState, DeviceError> {
        self.begin(DeviceOp::GetState).await?;
        let on = self.is_on();
        Ok(SwitchState {
            id: "switch-fake".to_string(),
            value: on,
            state: if on { "ON" } else { "OFF" }.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
