// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bubbles_adapters::{DeviceOp, FakeDeviceAdapter};
use tempfile::TempDir;

fn test_config(dir: &TempDir) -> Config {
    Config::with_dirs(dir.path().join("state"), dir.path().join("sock"), None)
}

#[test]
fn default_paths_live_under_state_dir() {
    let config = Config::with_dirs(
        PathBuf::from("/state/bubbles"),
        PathBuf::from("/tmp/bubbles"),
        None,
    );

    assert_eq!(
        config.config_path,
        PathBuf::from("/state/bubbles/config/RistoBubblesConfig.json")
    );
    assert_eq!(config.socket_path, PathBuf::from("/tmp/bubbles/bubblesd.sock"));
    assert_eq!(config.lock_path, PathBuf::from("/state/bubbles/daemon.pid"));
    assert_eq!(config.log_path, PathBuf::from("/state/bubbles/daemon.log"));
}

#[test]
fn config_path_can_be_overridden() {
    let config = Config::with_dirs(
        PathBuf::from("/state"),
        PathBuf::from("/sock"),
        Some(PathBuf::from("/etc/bubbles.json")),
    );

    assert_eq!(config.config_path, PathBuf::from("/etc/bubbles.json"));
}

#[tokio::test]
async fn startup_creates_runtime_files() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let daemon = startup_with(&config, |_| FakeDeviceAdapter::new())
        .await
        .unwrap();

    assert!(config.socket_path.exists());
    assert!(config.config_path.exists());
    let pid = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    assert!(daemon.accumulator.enabled());
}

#[tokio::test]
async fn device_is_built_from_configured_address() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    std::fs::create_dir_all(config.config_path.parent().unwrap()).unwrap();
    std::fs::write(
        &config.config_path,
        r#"{"RistoBubblesMachine": "10.0.0.7"}"#,
    )
    .unwrap();

    let mut seen = None;
    let _daemon = startup_with(&config, |address| {
        seen = Some(address.to_string());
        FakeDeviceAdapter::new()
    })
    .await
    .unwrap();

    assert_eq!(seen.as_deref(), Some("10.0.0.7"));
}

#[tokio::test]
async fn second_daemon_is_locked_out() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let _first = startup_with(&config, |_| FakeDeviceAdapter::new())
        .await
        .unwrap();

    let second = startup_with(&config, |_| FakeDeviceAdapter::new()).await;

    assert!(matches!(second, Err(LifecycleError::LockFailed(_))));
    // The running daemon keeps its files
    assert!(config.lock_path.exists());
    assert!(config.socket_path.exists());
}

#[tokio::test]
async fn malformed_settings_block_startup() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    std::fs::create_dir_all(config.config_path.parent().unwrap()).unwrap();
    std::fs::write(&config.config_path, "{ not json").unwrap();

    let result = startup_with(&config, |_| FakeDeviceAdapter::new()).await;

    assert!(matches!(result, Err(LifecycleError::Config(_))));
    assert!(!config.socket_path.exists());
    assert!(!config.lock_path.exists());
}

#[tokio::test]
async fn shutdown_switches_off_and_removes_files() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let fake = FakeDeviceAdapter::new();
    let device = fake.clone();
    let mut daemon = startup_with(&config, move |_| device).await.unwrap();

    daemon.accumulator.add_duration(10.0);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    daemon.shutdown().await.unwrap();

    assert_eq!(fake.ops(), vec![DeviceOp::TurnOn, DeviceOp::TurnOff]);
    assert!(!config.socket_path.exists());
    assert!(!config.lock_path.exists());
    assert!(!config.version_path.exists());
}
