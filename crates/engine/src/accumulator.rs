// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bubble accumulator
//!
//! Front door for everything that wants bubbles: triggers enqueue durations,
//! the worker task turns them into device commands, and operators can stop,
//! toggle, or query the machine directly.

use crate::controller::DeviceController;
use crate::shutdown::{Shutdown, ShutdownSignal};
use crate::worker::{DurationRequest, Worker};
use bubbles_adapters::DeviceAdapter;
use bubbles_storage::ConfigStore;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How long shutdown waits for the final OFF and the worker exit
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Accumulator dependencies
pub struct AccumulatorDeps<D> {
    pub device: D,
    pub config: Arc<ConfigStore>,
}

/// Point-in-time view of the accumulator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccumulatorStatus {
    pub enabled: bool,
    pub active: bool,
    pub blast_duration: f64,
    pub donation_threshold: f64,
}

pub struct Accumulator<D> {
    config: Arc<ConfigStore>,
    device: DeviceController<D>,
    queue: Mutex<Option<mpsc::UnboundedSender<DurationRequest>>>,
    active: Arc<AtomicBool>,
    owes_off: Arc<AtomicBool>,
    stops: Arc<AtomicU64>,
    shutting_down: AtomicBool,
    signal: ShutdownSignal,
    worker: Mutex<Option<JoinHandle<()>>>,
    grace_period: Duration,
}

impl<D: DeviceAdapter> Accumulator<D> {
    /// Create the accumulator and spawn its worker on the current runtime
    pub fn start(deps: AccumulatorDeps<D>) -> Self {
        Self::with_grace_period(deps, DEFAULT_GRACE_PERIOD)
    }

    pub fn with_grace_period(deps: AccumulatorDeps<D>, grace_period: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let device = DeviceController::new(deps.device);
        let active = Arc::new(AtomicBool::new(false));
        let owes_off = Arc::new(AtomicBool::new(false));
        let stops = Arc::new(AtomicU64::new(0));
        let signal = ShutdownSignal::new();

        let worker = Worker::new(
            rx,
            device.clone(),
            Arc::clone(&active),
            Arc::clone(&owes_off),
            Arc::clone(&stops),
            signal.listener(),
        );
        let handle = tokio::spawn(async move {
            match worker.run().await {
                Ok(()) => tracing::debug!("bubble worker stopped"),
                Err(e) => tracing::error!(error = %e, "bubble worker failed, device control lost"),
            }
        });

        Self {
            config: deps.config,
            device,
            queue: Mutex::new(Some(tx)),
            active,
            owes_off,
            stops,
            shutting_down: AtomicBool::new(false),
            signal,
            worker: Mutex::new(Some(handle)),
            grace_period,
        }
    }

    /// Queue one blast.
    ///
    /// Ignored while disabled, while shutting down, or for a negative
    /// request. The queued length is always the configured blast duration;
    /// `seconds` only gates the call. Returns whether a blast was queued.
    pub fn add_duration(&self, seconds: f64) -> bool {
        if self.shutting_down.load(Ordering::SeqCst) {
            tracing::debug!(seconds, "shutting down, duration ignored");
            return false;
        }
        if seconds.is_nan() || seconds < 0.0 {
            tracing::debug!(seconds, "negative duration ignored");
            return false;
        }
        let config = self.config.snapshot();
        if !config.enabled {
            tracing::debug!(seconds, "bubbles disabled, duration ignored");
            return false;
        }

        let request = DurationRequest::new(
            config.blast_duration,
            self.stops.load(Ordering::Acquire),
        );
        let queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        match queue.as_ref() {
            Some(tx) if tx.send(request).is_ok() => {
                tracing::info!(seconds = config.blast_duration, "bubbles queued");
                true
            }
            _ => {
                tracing::debug!("queue closed, duration dropped");
                false
            }
        }
    }

    /// Emergency stop: disable, then switch off without going through the
    /// queue. Durations already queued stay queued.
    pub async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::AcqRel);
        if let Err(e) = self.config.set_enabled(false) {
            tracing::error!(error = %e, "failed to persist disabled state");
        }
        tracing::warn!("emergency stop");
        if !self.device.try_set_state(false, &self.listener()).await {
            tracing::warn!("switch did not confirm stop");
        }
        self.active.store(false, Ordering::SeqCst);
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled()
    }

    /// Persist the enabled flag. Disk failures keep the new value in memory.
    pub fn set_enabled(&self, enabled: bool) {
        if let Err(e) = self.config.set_enabled(enabled) {
            tracing::error!(error = %e, enabled, "failed to persist enabled state");
        }
        tracing::info!(enabled, "bubbles enabled changed");
    }

    /// Last state the accumulator commanded (not a device reading)
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> AccumulatorStatus {
        let config = self.config.snapshot();
        AccumulatorStatus {
            enabled: config.enabled,
            active: self.is_active(),
            blast_duration: config.blast_duration,
            donation_threshold: config.donation_threshold,
        }
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Ask the switch for its position; `None` when unreachable
    pub async fn device_state(&self) -> Option<bool> {
        self.device.get_state(&self.listener()).await
    }

    /// Flip the switch directly, bypassing the queue
    pub async fn toggle(&self) -> bool {
        self.device.try_toggle_state(&self.listener()).await
    }

    /// Stop accepting work, cancel the worker, and leave the device off.
    ///
    /// Sends at most one OFF of its own, only if bubbles were on or the
    /// worker had not yet switched off after an earlier ON. Returns
    /// after the worker exits or the grace period runs out. Later calls are
    /// no-ops.
    pub async fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("bubble accumulator shutting down");
        self.signal.trigger();
        drop(self.queue.lock().unwrap_or_else(|e| e.into_inner()).take());

        let was_active =
            self.active.load(Ordering::SeqCst) || self.owes_off.load(Ordering::SeqCst);
        let handle = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take();
        let finish = async move {
            if was_active {
                tracing::info!("bubbles off for shutdown");
                self.device.try_set_state(false, &Shutdown::never()).await;
                self.active.store(false, Ordering::SeqCst);
                self.owes_off.store(false, Ordering::SeqCst);
            }
            if let Some(handle) = handle {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "bubble worker panicked");
                }
            }
        };
        if tokio::time::timeout(self.grace_period, finish).await.is_err() {
            tracing::warn!(
                grace_ms = self.grace_period.as_millis() as u64,
                "shutdown grace period elapsed"
            );
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    fn listener(&self) -> Shutdown {
        self.signal.listener()
    }
}

#[cfg(test)]
#[path = "accumulator_tests.rs"]
mod tests;
