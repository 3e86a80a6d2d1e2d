// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP switch adapter
//!
//! Talks to an ESPHome-style REST switch at `http://{address}/switch/{name}`.
//! ureq is blocking, so every request runs on the blocking pool. A blocking
//! request keeps running when its caller is cancelled, so commands take a
//! shared lock on the blocking thread and reach the switch in the order they
//! were issued.

use super::{DeviceAdapter, DeviceError, SwitchState};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Switch entity exposed by the bubble machine firmware
pub const DEFAULT_SWITCH_NAME: &str = "risto_bubbles";
/// Upper bound for a single request, connect included
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Switch adapter backed by HTTP requests
#[derive(Clone)]
pub struct HttpDeviceAdapter {
    base_url: String,
    agent: ureq::Agent,
    commands: Arc<Mutex<()>>,
}

impl HttpDeviceAdapter {
    /// Adapter for the default switch on `address` (host or host:port)
    pub fn new(address: &str) -> Self {
        Self::with_switch(address, DEFAULT_SWITCH_NAME, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_switch(address: &str, switch_name: &str, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            base_url: switch_url(address, switch_name),
            agent: ureq::Agent::new_with_config(config),
            commands: Arc::new(Mutex::new(())),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn action_url(&self, action: &str) -> String {
        format!("{}/{}", self.base_url, action)
    }

    async fn post(&self, action: &str) -> Result<(), DeviceError> {
        let agent = self.agent.clone();
        let url = self.action_url(action);
        let commands = Arc::clone(&self.commands);

        tokio::task::spawn_blocking(move || {
            let _serial = commands.lock().unwrap_or_else(|e| e.into_inner());
            agent
                .post(&url)
                .send_empty()
                .map(|_| ())
                .map_err(map_ureq_error)
        })
        .await
        .map_err(|e| DeviceError::Task(e.to_string()))?
    }
}

#[async_trait]
impl DeviceAdapter for HttpDeviceAdapter {
    async fn set_state(&self, on: bool) -> Result<(), DeviceError> {
        self.post(if on { "turn_on" } else { "turn_off" }).await
    }

    async fn toggle(&self) -> Result<(), DeviceError> {
        self.post("toggle").await
    }

    async fn state(&self) -> Result<SwitchState, DeviceError> {
        let agent = self.agent.clone();
        let url = self.base_url.clone();

        let body = tokio::task::spawn_blocking(move || {
            let mut response = agent.get(&url).call().map_err(map_ureq_error)?;
            response
                .body_mut()
                .read_to_string()
                .map_err(|e| DeviceError::InvalidResponse(e.to_string()))
        })
        .await
        .map_err(|e| DeviceError::Task(e.to_string()))??;

        parse_switch_state(&body)
    }
}

/// Build the switch endpoint, tolerating a scheme or trailing slash in `address`
fn switch_url(address: &str, switch_name: &str) -> String {
    let host = address
        .trim()
        .trim_start_matches("http://")
        .trim_end_matches('/');
    format!("http://{}/switch/{}", host, switch_name)
}

fn parse_switch_state(body: &str) -> Result<SwitchState, DeviceError> {
    serde_json::from_str(body).map_err(|e| DeviceError::InvalidResponse(e.to_string()))
}

fn map_ureq_error(error: ureq::Error) -> DeviceError {
    match error {
        ureq::Error::StatusCode(code) => DeviceError::Status(code),
        other => DeviceError::Transport(other.to_string()),
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
