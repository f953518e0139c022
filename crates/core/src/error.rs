// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for minder-core operations.

use thiserror::Error;

/// All possible errors that can occur in minder-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid HTTP method: '{0}'\n  hint: valid methods are: GET, POST, PUT, PATCH, DELETE")]
    InvalidMethod(String),

    #[error("invalid conflict policy: '{0}'\n  hint: valid policies are: server-wins, client-wins, manual")]
    InvalidConflictPolicy(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for minder-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
