// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::device::{DeviceOp, FakeDeviceAdapter};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

#[tokio::test]
async fn traced_device_forwards_to_inner() {
    let fake = FakeDeviceAdapter::new();
    let traced = TracedDeviceAdapter::new(fake.clone());

    traced.set_state(true).await.unwrap();
    traced.toggle().await.unwrap();
    let state = traced.state().await.unwrap();

    assert!(!state.value);
    assert_eq!(
        fake.ops(),
        vec![DeviceOp::TurnOn, DeviceOp::Toggle, DeviceOp::GetState]
    );
}

#[tokio::test]
async fn traced_device_passes_errors_through() {
    let fake = FakeDeviceAdapter::new();
    fake.set_failing(true);
    let traced = TracedDeviceAdapter::new(fake);

    let err = traced.set_state(false).await.unwrap_err();
    assert!(err.to_string().contains("fake switch unreachable"));
}

#[test]
fn traced_set_state_logs_span_and_timing() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedDeviceAdapter::new(FakeDeviceAdapter::new());
        traced.set_state(true).await
    });

    assert!(result.is_ok(), "set_state should succeed: {:?}", result);
    assert!(
        logs.contains("device.set_state"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("on=true"),
        "Should log target state. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("switch set"),
        "Should log completion. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("elapsed_ms"),
        "Should log timing. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_set_state_logs_failure_as_warning() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeDeviceAdapter::new();
        fake.set_failing(true);
        TracedDeviceAdapter::new(fake).set_state(false).await
    });

    assert!(result.is_err());
    assert!(logs.contains("WARN"), "Should warn. Logs:\n{}", logs);
    assert!(
        logs.contains("set_state failed"),
        "Should log failure. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_toggle_logs_operation() {
    let (logs, _) = with_tracing(|| async {
        TracedDeviceAdapter::new(FakeDeviceAdapter::new())
            .toggle()
            .await
    });

    assert!(
        logs.contains("device.toggle"),
        "Should log span. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("switch toggled"),
        "Should log toggle. Logs:\n{}",
        logs
    );
}
