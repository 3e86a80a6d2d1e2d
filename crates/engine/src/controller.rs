// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort device control
//!
//! Every call can be abandoned by the shutdown signal, and every failure is
//! folded into the return value. Nothing is retried; a failed call leaves a
//! stale device, never a broken program state.

use crate::shutdown::Shutdown;
use bubbles_adapters::DeviceAdapter;

#[derive(Clone)]
pub struct DeviceController<D> {
    device: D,
}

impl<D: DeviceAdapter> DeviceController<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Turn the device on or off. Returns whether the switch acknowledged.
    pub async fn try_set_state(&self, on: bool, cancel: &Shutdown) -> bool {
        tokio::select! {
            biased;
            _ = cancel.triggered() => {
                tracing::debug!(on, "set_state cancelled");
                false
            }
            result = self.device.set_state(on) => match result {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!(on, error = %e, "set_state not acknowledged");
                    false
                }
            },
        }
    }

    /// Flip the device. Returns whether the switch acknowledged.
    pub async fn try_toggle_state(&self, cancel: &Shutdown) -> bool {
        tokio::select! {
            biased;
            _ = cancel.triggered() => false,
            result = self.device.toggle() => result.is_ok(),
        }
    }

    /// Ask the switch whether it is on; `None` when it cannot be reached
    pub async fn get_state(&self, cancel: &Shutdown) -> Option<bool> {
        tokio::select! {
            biased;
            _ = cancel.triggered() => None,
            result = self.device.state() => match result {
                Ok(state) => Some(state.value),
                Err(e) => {
                    tracing::debug!(error = %e, "state unknown");
                    None
                }
            },
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
