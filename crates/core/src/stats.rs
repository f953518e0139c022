// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Summary of one sync pass.

use serde::{Deserialize, Serialize};

/// A failed replay attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailure {
    pub request_id: String,
    pub error: String,
}

/// Immutable summary of one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    /// Items attempted in this pass.
    pub total: usize,
    pub successful: usize,
    /// Failed attempts in this pass, whether retryable or terminal.
    pub failed: usize,
    /// Conflicting items dropped in favour of server state.
    pub discarded: usize,
    /// Conflicting items left in the queue for a later pass.
    pub deferred: usize,
    /// Items left in the queue after the pass.
    pub pending: usize,
    pub duration_ms: u64,
    pub errors: Vec<SyncFailure>,
}

impl SyncStats {
    /// Returns true if every attempted item succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.deferred == 0
    }
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
