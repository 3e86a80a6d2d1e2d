// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background task that turns queued durations into device commands
//!
//! The worker is the only place that reads the duration queue and the only
//! place that changes [`WorkerState`]. Each request owns a window that starts
//! when it was enqueued, so the device stays on until the latest window
//! closes and then goes off once the queue is empty.

use crate::controller::DeviceController;
use crate::error::AccumulatorError;
use crate::shutdown::Shutdown;
use bubbles_adapters::DeviceAdapter;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::Instant;

/// One queued activation
#[derive(Debug, Clone, Copy)]
pub(crate) struct DurationRequest {
    pub seconds: f64,
    pub enqueued_at: Instant,
    /// Stop count at enqueue time
    pub generation: u64,
}

impl DurationRequest {
    pub fn new(seconds: f64, generation: u64) -> Self {
        Self {
            seconds,
            enqueued_at: Instant::now(),
            generation,
        }
    }

    fn deadline(&self) -> Result<Instant, AccumulatorError> {
        Duration::try_from_secs_f64(self.seconds)
            .ok()
            .and_then(|length| self.enqueued_at.checked_add(length))
            .ok_or(AccumulatorError::InvalidDuration(self.seconds))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerState {
    /// Device off, waiting for the next request
    Idle,
    /// Device commanded on, consuming the queue
    Active,
}

pub(crate) struct Worker<D> {
    queue: mpsc::UnboundedReceiver<DurationRequest>,
    device: DeviceController<D>,
    /// Last state this worker commanded, visible to the accumulator
    active: Arc<AtomicBool>,
    /// Set from an ON until the worker's own OFF lands; survives stop
    owes_off: Arc<AtomicBool>,
    /// Bumped by every emergency stop
    stops: Arc<AtomicU64>,
    shutdown: Shutdown,
    state: WorkerState,
    /// Stop generation of the last ON this worker sent
    lit: Option<u64>,
}

impl<D: DeviceAdapter> Worker<D> {
    pub fn new(
        queue: mpsc::UnboundedReceiver<DurationRequest>,
        device: DeviceController<D>,
        active: Arc<AtomicBool>,
        owes_off: Arc<AtomicBool>,
        stops: Arc<AtomicU64>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            queue,
            device,
            active,
            owes_off,
            stops,
            shutdown,
            state: WorkerState::Idle,
            lit: None,
        }
    }

    /// Run until shutdown or until the queue closes.
    ///
    /// Cancellation never sends OFF; the accumulator owns the final OFF.
    pub async fn run(mut self) -> Result<(), AccumulatorError> {
        loop {
            match self.state {
                WorkerState::Idle => {
                    let request = tokio::select! {
                        biased;
                        _ = self.shutdown.triggered() => return Ok(()),
                        request = self.queue.recv() => match request {
                            Some(request) => request,
                            None => return Ok(()),
                        },
                    };
                    self.state = WorkerState::Active;
                    if !self.consume(request).await? {
                        return Ok(());
                    }
                }
                WorkerState::Active => match self.queue.try_recv() {
                    Ok(request) => {
                        if !self.consume(request).await? {
                            return Ok(());
                        }
                    }
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => {
                        if !self.go_idle().await {
                            return Ok(());
                        }
                    }
                },
            }
        }
    }

    /// Light the device if needed, then hold until the request's window
    /// closes. Returns false when cancelled.
    async fn consume(&mut self, request: DurationRequest) -> Result<bool, AccumulatorError> {
        let deadline = request.deadline()?;
        let stops = self.stops.load(Ordering::Acquire);

        // Requests queued before a stop keep their window but never relight
        if request.generation == stops && self.lit != Some(stops) {
            self.active.store(true, Ordering::SeqCst);
            self.owes_off.store(true, Ordering::SeqCst);
            self.lit = Some(stops);
            tracing::info!(seconds = request.seconds, "bubbles on");
            self.device.try_set_state(true, &self.shutdown).await;
        } else {
            tracing::debug!(seconds = request.seconds, "window extended");
        }

        tokio::select! {
            biased;
            _ = self.shutdown.triggered() => Ok(false),
            _ = tokio::time::sleep_until(deadline) => Ok(true),
        }
    }

    /// Queue drained: switch off and wait for the next request.
    /// Returns false when cancelled.
    ///
    /// The OFF goes out even when a stop already sent one, since the ON
    /// that preceded the stop may have reached the switch after it.
    async fn go_idle(&mut self) -> bool {
        if self.lit.is_some() {
            tracing::info!("bubbles off");
            self.device.try_set_state(false, &self.shutdown).await;
            if self.shutdown.is_triggered() {
                // Leave the flags set so shutdown sends its own OFF
                return false;
            }
        }
        self.lit = None;
        self.owes_off.store(false, Ordering::SeqCst);
        self.active.store(false, Ordering::SeqCst);
        self.state = WorkerState::Idle;
        true
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
