// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the bubble engine

use thiserror::Error;

/// Errors that end the accumulator worker
#[derive(Debug, Error)]
pub enum AccumulatorError {
    #[error("duration out of range: {0} seconds")]
    InvalidDuration(f64),
}
