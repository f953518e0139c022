// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict handling for replayed writes.
//!
//! A replay conflicts when the server reports newer state than the queued
//! change assumed. The configured [`ConflictPolicy`] decides what happens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Rule applied when a queued write's assumptions are invalidated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Drop the queued change.
    #[default]
    ServerWins,
    /// Force the queued change through.
    ClientWins,
    /// Ask the host application.
    Manual,
}

impl ConflictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::ServerWins => "server-wins",
            ConflictPolicy::ClientWins => "client-wins",
            ConflictPolicy::Manual => "manual",
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "server-wins" => Ok(ConflictPolicy::ServerWins),
            "client-wins" => Ok(ConflictPolicy::ClientWins),
            "manual" => Ok(ConflictPolicy::Manual),
            _ => Err(Error::InvalidConflictPolicy(s.to_string())),
        }
    }
}

/// Outcome chosen by a manual conflict resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    /// Keep the server state; the queued change is discarded.
    UseServer,
    /// Re-send the queued change, overwriting the server state.
    UseClient,
    /// Leave the item queued for a later pass without spending a retry.
    Defer,
}

impl From<ConflictPolicy> for Option<ConflictResolution> {
    /// The fixed resolution a policy implies, or `None` for manual.
    fn from(policy: ConflictPolicy) -> Self {
        match policy {
            ConflictPolicy::ServerWins => Some(ConflictResolution::UseServer),
            ConflictPolicy::ClientWins => Some(ConflictResolution::UseClient),
            ConflictPolicy::Manual => None,
        }
    }
}

#[cfg(test)]
#[path = "conflict_tests.rs"]
mod tests;
