// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration.
//!
//! Configuration is grouped in sections matching the components:
//! - `offline`: queue capacity, batching, retry budget, auto-sync, storage key
//! - `token`: refresh threshold and how the credential is attached
//! - `transport`: HTTP timeout and base URL
//! - `network`: reachability probe targets and polling
//!
//! Every field has a default, so an empty document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::conflict::ConflictPolicy;
use crate::error::{Error, Result};
use crate::request::DEFAULT_MAX_RETRIES;

/// Default storage key for the persisted queue.
pub const DEFAULT_STORAGE_KEY: &str = "minder_offline_queue";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub offline: OfflineConfig,
    pub token: TokenConfig,
    pub transport: TransportConfig,
    pub network: NetworkConfig,
}

impl Config {
    /// Checks invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.offline.max_queue_size == 0 {
            return Err(Error::InvalidConfig("offline.max_queue_size must be at least 1".into()));
        }
        if self.offline.batch_size == 0 {
            return Err(Error::InvalidConfig("offline.batch_size must be at least 1".into()));
        }
        if self.offline.storage_key.trim().is_empty() {
            return Err(Error::InvalidConfig("offline.storage_key must not be empty".into()));
        }
        if self.token.auth_header.trim().is_empty() {
            return Err(Error::InvalidConfig("token.auth_header must not be empty".into()));
        }
        if self.transport.timeout_secs == 0 {
            return Err(Error::InvalidConfig("transport.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}

/// Offline queue and sync driver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Maximum number of queued requests before eviction (default: 100).
    pub max_queue_size: usize,
    /// Requests dispatched concurrently per batch (default: 5).
    pub batch_size: usize,
    /// Retry budget for requests that don't set their own (default: 3).
    pub max_retries: u32,
    /// Sync automatically when connectivity returns (default: true).
    pub auto_sync: bool,
    /// Storage key holding the serialized queue.
    pub storage_key: String,
    /// Conflict policy for replayed writes (default: server-wins).
    pub conflict_policy: ConflictPolicy,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        OfflineConfig {
            max_queue_size: 100,
            batch_size: 5,
            max_retries: DEFAULT_MAX_RETRIES,
            auto_sync: true,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

/// Token refresh settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Lead time before expiry at which a refresh is scheduled (default: 300).
    pub refresh_threshold_secs: u64,
    /// Header carrying the credential (default: "Authorization").
    pub auth_header: String,
    /// Scheme prepended to the token; empty sends the bare token (default: "Bearer").
    pub auth_scheme: String,
}

impl TokenConfig {
    pub fn refresh_threshold(&self) -> Duration {
        Duration::from_secs(self.refresh_threshold_secs)
    }

    /// Renders the header value for `token`.
    pub fn header_value(&self, token: &str) -> String {
        if self.auth_scheme.is_empty() {
            token.to_string()
        } else {
            format!("{} {}", self.auth_scheme, token)
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        TokenConfig {
            refresh_threshold_secs: 300,
            auth_header: "Authorization".to_string(),
            auth_scheme: "Bearer".to_string(),
        }
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Per-request timeout in seconds (default: 30).
    pub timeout_secs: u64,
    /// Prefix for relative request URLs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolves `url` against the base URL when it is relative.
    pub fn resolve_url(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if !url.contains("://") => {
                format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
            }
            _ => url.to_string(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig { timeout_secs: 30, base_url: None }
    }
}

/// Reachability probe settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// `host:port` targets; any successful TCP connect means online.
    pub probe_hosts: Vec<String>,
    /// Timeout per probe attempt in milliseconds (default: 3000).
    pub probe_timeout_ms: u64,
    /// Seconds between background probes. 0 = disabled (default: 30).
    pub poll_interval_secs: u64,
}

impl NetworkConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_secs > 0).then(|| Duration::from_secs(self.poll_interval_secs))
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            probe_hosts: vec!["1.1.1.1:443".to_string(), "8.8.8.8:53".to_string()],
            probe_timeout_ms: 3000,
            poll_interval_secs: 30,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
