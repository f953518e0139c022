// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued request model.
//!
//! A [`QueuedRequest`] is a durable description of a deferred mutation. The
//! queue keeps requests in a total order:
//! 1. Higher priority first
//! 2. Earlier enqueue timestamp first
//! 3. Insertion order (the queue sorts stably)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::clock::ms_to_datetime;
use crate::error::{Error, Result};

/// Default retry budget for a queued request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// HTTP method of a queued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

/// Caller-supplied options for enqueueing a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub priority: i32,
    /// Overrides the queue's default retry budget.
    pub max_retries: Option<u32>,
    pub metadata: BTreeMap<String, Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

/// A deferred mutation awaiting network replay.
///
/// Field names serialize in camelCase so the persisted JSON array keeps the
/// same shape across implementations sharing a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRequest {
    pub id: String,
    pub method: HttpMethod,
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default)]
    pub priority: i32,
    /// Enqueue time in milliseconds since Unix epoch.
    pub timestamp: u64,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl QueuedRequest {
    /// Creates a fresh request with a zero retry count.
    pub fn new(
        id: String,
        method: HttpMethod,
        url: String,
        options: RequestOptions,
        default_max_retries: u32,
        timestamp: u64,
    ) -> Self {
        QueuedRequest {
            id,
            method,
            url,
            headers: options.headers,
            body: options.body,
            priority: options.priority,
            timestamp,
            retry_count: 0,
            max_retries: options.max_retries.unwrap_or(default_max_retries),
            last_error: None,
            metadata: options.metadata,
        }
    }

    /// Queue ordering: higher priority first, then earlier enqueue time.
    ///
    /// Equal keys compare equal; the queue relies on a stable sort to keep
    /// insertion order among them.
    pub fn queue_order(a: &QueuedRequest, b: &QueuedRequest) -> Ordering {
        b.priority.cmp(&a.priority).then_with(|| a.timestamp.cmp(&b.timestamp))
    }

    /// Records a failed attempt.
    ///
    /// Returns true if the request is now terminal and must not be retried.
    pub fn record_failure(&mut self, error: impl Into<String>) -> bool {
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_error = Some(error.into());
        self.is_exhausted()
    }

    /// Returns true once the retry budget has been exceeded.
    pub fn is_exhausted(&self) -> bool {
        self.retry_count > self.max_retries
    }

    /// Enqueue time as a UTC timestamp.
    pub fn enqueued_at(&self) -> DateTime<Utc> {
        ms_to_datetime(self.timestamp)
    }
}

/// Sorts requests into queue order in place.
pub fn sort_queue(requests: &mut [QueuedRequest]) {
    requests.sort_by(QueuedRequest::queue_order);
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
