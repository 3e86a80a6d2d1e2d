// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn fake_device_records_calls() {
    let adapter = FakeDeviceAdapter::new();

    adapter.set_state(true).await.unwrap();
    adapter.toggle().await.unwrap();
    adapter.state().await.unwrap();

    assert_eq!(
        adapter.ops(),
        vec![DeviceOp::TurnOn, DeviceOp::Toggle, DeviceOp::GetState]
    );
    assert_eq!(adapter.count(DeviceOp::TurnOn), 1);
}

#[tokio::test]
async fn fake_device_tracks_switch_position() {
    let adapter = FakeDeviceAdapter::new();
    assert!(!adapter.is_on());

    adapter.set_state(true).await.unwrap();
    assert!(adapter.state().await.unwrap().value);

    adapter.toggle().await.unwrap();
    let state = adapter.state().await.unwrap();
    assert!(!state.value);
    assert_eq!(state.state, "OFF");
}

#[tokio::test]
async fn failing_device_still_records_and_keeps_position() {
    let adapter = FakeDeviceAdapter::new();
    adapter.set_failing(true);

    assert!(adapter.set_state(true).await.is_err());
    assert!(!adapter.is_on());
    assert_eq!(adapter.ops(), vec![DeviceOp::TurnOn]);
}

#[tokio::test(start_paused = true)]
async fn latency_delays_completion() {
    let adapter = FakeDeviceAdapter::new();
    adapter.set_latency(Duration::from_secs(3));
    let start = Instant::now();

    adapter.set_state(true).await.unwrap();

    assert_eq!(adapter.calls()[0].at, start);
    assert!(start.elapsed() >= Duration::from_secs(3));
}
