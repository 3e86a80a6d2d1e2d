// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use bubbles_adapters::{DeviceAdapter, HttpDeviceAdapter, TracedDeviceAdapter};
use bubbles_engine::{Accumulator, AccumulatorDeps, CommandHandler, DonationListener};
use bubbles_storage::{ConfigStore, StorageError, CONFIG_FILE_NAME};
use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

/// Switch adapter used by the real daemon
pub type DaemonDevice = TracedDeviceAdapter<HttpDeviceAdapter>;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bubble machine settings file
    pub config_path: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
}

impl Config {
    /// Resolve paths from the environment; `config_path` overrides the
    /// default settings location
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, LifecycleError> {
        Ok(Self::with_dirs(state_dir()?, socket_dir(), config_path))
    }

    pub fn with_dirs(
        state_dir: PathBuf,
        socket_dir: PathBuf,
        config_path: Option<PathBuf>,
    ) -> Self {
        Self {
            config_path: config_path
                .unwrap_or_else(|| state_dir.join("config").join(CONFIG_FILE_NAME)),
            socket_path: socket_dir.join("bubblesd.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
        }
    }
}

/// Daemon state during operation
pub struct DaemonState<D = DaemonDevice> {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Unix socket listener
    pub listener: UnixListener,
    pub accumulator: Arc<Accumulator<D>>,
    pub commands: CommandHandler<D>,
    pub donations: DonationListener<D>,
    /// When daemon started
    pub start_time: Instant,
    /// Shutdown requested flag
    pub shutdown_requested: bool,
}

impl<D: DeviceAdapter> DaemonState<D> {
    /// Shutdown the daemon gracefully
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // 1. Leave the machine off and stop the worker
        self.accumulator.shutdown().await;

        // 2. Remove socket file
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        // 3. Remove PID file
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 4. Remove version file
        if self.config.version_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.version_path) {
                warn!("Failed to remove version file: {}", e);
            }
        }

        // 5. Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon against the HTTP switch named in the settings file
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    startup_with(config, |address| {
        TracedDeviceAdapter::new(HttpDeviceAdapter::new(address))
    })
    .await
}

/// Start the daemon with a caller-built switch adapter
pub async fn startup_with<D, F>(
    config: &Config,
    make_device: F,
) -> Result<DaemonState<D>, LifecycleError>
where
    D: DeviceAdapter,
    F: FnOnce(&str) -> D,
{
    match startup_inner(config, make_device).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // A lock failure means another daemon owns these files
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner<D, F>(
    config: &Config,
    make_device: F,
) -> Result<DaemonState<D>, LifecycleError>
where
    D: DeviceAdapter,
    F: FnOnce(&str) -> D,
{
    // 1. Create state and socket directories
    if let Some(parent) = config.lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // 2. Acquire lock file FIRST - prevents races
    let lock_file = File::options()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file
    use std::io::Write;
    lock_file.set_len(0)?;
    let mut lock_file = lock_file;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // 3. Load settings BEFORE binding socket (fail fast on a bad file)
    let store = Arc::new(ConfigStore::open(&config.config_path)?);
    let settings = store.snapshot();
    info!(
        path = %config.config_path.display(),
        enabled = settings.enabled,
        device = %settings.device_address,
        blast_duration = settings.blast_duration,
        donation_threshold = settings.donation_threshold,
        "Loaded bubble settings"
    );

    // 4. Remove stale socket and bind
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    // 5. Start the accumulator worker (LAST - only after all validation passes)
    let accumulator = Arc::new(Accumulator::start(AccumulatorDeps {
        device: make_device(&settings.device_address),
        config: store,
    }));

    info!("Daemon started");

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        commands: CommandHandler::new(Arc::clone(&accumulator)),
        donations: DonationListener::new(Arc::clone(&accumulator)),
        accumulator,
        start_time: Instant::now(),
        shutdown_requested: false,
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.version_path.exists() {
        let _ = std::fs::remove_file(&config.version_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

/// Get the state directory for bubbles
fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("bubbles"));
    }

    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/bubbles"))
}

/// Get the socket directory for bubbles
///
/// Uses /tmp/bubbles by default to keep paths short (macOS SUN_LEN = 104).
/// Can be overridden with BUBBLES_SOCKET_DIR for testing.
fn socket_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BUBBLES_SOCKET_DIR") {
        return PathBuf::from(dir);
    }
    PathBuf::from("/tmp/bubbles")
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
