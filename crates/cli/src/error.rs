// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors reported by the `minder` command line.
///
/// Messages carry a hint line where the fix is not obvious.
#[derive(Debug, Error)]
pub enum Error {
    #[error("request not found: {0}\n  hint: run 'minder queue list' to see queued ids")]
    RequestNotFound(String),

    #[error("invalid header '{0}'\n  hint: headers take the form 'Name: value'")]
    InvalidHeader(String),

    #[error("invalid body: {0}\n  hint: --body expects a JSON document")]
    InvalidBody(serde_json::Error),

    #[error("token has no readable 'exp' claim")]
    UnreadableToken,

    #[error("{failed} of {total} requests failed")]
    SyncFailed { failed: usize, total: usize },

    #[error("another sync is already running")]
    SyncBusy,

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] minder_core::Error),

    #[error(transparent)]
    Sync(#[from] minder_sync::Error),

    #[error("storage error: {0}")]
    Storage(#[from] minder_sync::StorageError),

    #[error("transport error: {0}")]
    Transport(#[from] minder_sync::TransportError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
