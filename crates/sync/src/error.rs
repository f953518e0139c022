// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the sync engine.
//!
//! Storage and token failures never surface here: the queue logs storage
//! errors and keeps going, and the refresh scheduler reports through
//! [`crate::TokenEvents`].

use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced by [`crate::OfflineManager`] operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] minder_core::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for sync engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
