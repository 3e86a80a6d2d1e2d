// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-through JSON store for the bubble machine configuration

use bubbles_core::{BubblesConfig, ConfigError};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// File name used under the config directory
pub const CONFIG_FILE_NAME: &str = "RistoBubblesConfig.json";

/// Errors that can occur loading or saving configuration
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },
}

/// Configuration held in memory and persisted on every mutation.
///
/// The mutex is held across the file write so concurrent saves never
/// interleave.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    config: Mutex<BubblesConfig>,
}

impl ConfigStore {
    /// Load the config at `path`, creating it with defaults when absent.
    ///
    /// The loaded config is written back so fields added since the file was
    /// last saved appear on disk.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let config = if path.exists() {
            let json = fs::read_to_string(&path).map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;
            serde_json::from_str::<BubblesConfig>(&json).map_err(|source| StorageError::Json {
                path: path.clone(),
                source,
            })?
        } else {
            tracing::info!(path = %path.display(), "no config found, writing defaults");
            BubblesConfig::default()
        };

        config.validate().map_err(|source| StorageError::Invalid {
            path: path.clone(),
            source,
        })?;

        write_atomic(&path, &config)?;

        Ok(Self {
            path,
            config: Mutex::new(config),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy of the current configuration
    pub fn snapshot(&self) -> BubblesConfig {
        self.config.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn enabled(&self) -> bool {
        self.config.lock().unwrap_or_else(|e| e.into_inner()).enabled
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), StorageError> {
        self.update(|config| config.enabled = enabled).map(|_| ())
    }

    /// Apply `f` and persist the result.
    ///
    /// A change that breaks an invariant is rejected and leaves the store
    /// untouched. A failed write still keeps the in-memory change; the error
    /// only reports that the file is stale.
    pub fn update<F>(&self, f: F) -> Result<BubblesConfig, StorageError>
    where
        F: FnOnce(&mut BubblesConfig),
    {
        let mut guard = self.config.lock().unwrap_or_else(|e| e.into_inner());
        let mut next = guard.clone();
        f(&mut next);
        next.validate().map_err(|source| StorageError::Invalid {
            path: self.path.clone(),
            source,
        })?;

        *guard = next.clone();
        write_atomic(&self.path, &next)?;
        Ok(next)
    }
}

/// Write to a sibling temp file, then rename over the target
fn write_atomic(path: &Path, config: &BubblesConfig) -> Result<(), StorageError> {
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let temp_path = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&temp_path).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
    }

    // Atomic replace (rename is atomic on POSIX)
    fs::rename(&temp_path, path).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
#[path = "config_store_tests.rs"]
mod tests;
