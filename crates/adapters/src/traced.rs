// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::device::{DeviceAdapter, DeviceError, SwitchState};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any DeviceAdapter
#[derive(Clone)]
pub struct TracedDeviceAdapter<D> {
    inner: D,
}

impl<D> TracedDeviceAdapter<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

#[async_trait]
impl<D: DeviceAdapter> DeviceAdapter for TracedDeviceAdapter<D> {
    async fn set_state(&self, on: bool) -> Result<(), DeviceError> {
        let span = tracing::info_span!("device.set_state", on);

        async {
            tracing::debug!("sending");

            let start = std::time::Instant::now();
            let result = self.inner.set_state(on).await;
            let elapsed = start.elapsed();

            // A failed switch call is expected when the machine is unplugged
            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "switch set"),
                Err(e) => tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "set_state failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn toggle(&self) -> Result<(), DeviceError> {
        let span = tracing::info_span!("device.toggle");

        async {
            let result = self.inner.toggle().await;
            match &result {
                Ok(()) => tracing::info!("switch toggled"),
                Err(e) => tracing::warn!(error = %e, "toggle failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn state(&self) -> Result<SwitchState, DeviceError> {
        let result = self.inner.state().await;
        tracing::trace!(on = ?result.as_ref().ok().map(|s| s.value), "queried");
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
