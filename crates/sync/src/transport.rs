// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for replaying requests.
//!
//! Provides a trait-based transport layer that enables:
//! - Real HTTP delivery for production ([`crate::http::HttpTransport`])
//! - Mock transports for unit testing
//!
//! Failures are classified by [`TransportError::is_retryable`]. The sync
//! driver keeps retryable failures in the queue and drops the rest.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use minder_core::{HttpMethod, QueuedRequest};
use serde_json::Value;

/// Error type for transport operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request did not complete within the timeout.
    #[error("request timed out")]
    Timeout,

    /// The server could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The transport refused the request outright. Never retried.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The request was aborted locally.
    #[error("request cancelled")]
    Cancelled,
}

impl TransportError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        TransportError::Status { status, message: message.into() }
    }

    /// HTTP status code, if the server answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the server rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }

    /// Returns true if a later attempt may succeed.
    ///
    /// Server errors, throttling, request timeouts and expired credentials
    /// are transient. Every other 4xx is permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout
            | TransportError::ConnectionFailed(_)
            | TransportError::Cancelled => true,
            TransportError::Rejected(_) => false,
            TransportError::Status { status, .. } => {
                *status >= 500 || matches!(status, 401 | 408 | 429)
            }
        }
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by [`Transport::send`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = TransportResult<TransportResponse>> + Send + 'a>>;

/// A request ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    /// Ask the server to overwrite its state with this request's payload.
    pub overwrite: bool,
    /// Per-request timeout. `None` uses the transport default.
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        TransportRequest {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            overwrite: false,
            timeout: None,
        }
    }

    /// Builds a replay of a queued request.
    pub fn from_queued(request: &QueuedRequest) -> Self {
        TransportRequest {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
            overwrite: false,
            timeout: None,
        }
    }
}

/// A successful delivery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Option<Value>,
    /// Server state the request conflicted with, if any.
    pub conflict: Option<Value>,
}

impl TransportResponse {
    pub fn ok(status: u16) -> Self {
        TransportResponse { status, body: None, conflict: None }
    }

    pub fn conflict(server_state: Value) -> Self {
        TransportResponse { status: 409, body: None, conflict: Some(server_state) }
    }

    pub fn is_conflict(&self) -> bool {
        self.conflict.is_some()
    }
}

/// Delivers requests to the remote service.
///
/// Implementations are shared by every in-flight request in a batch, so
/// `send` takes `&self`.
pub trait Transport: Send + Sync {
    /// Send a request.
    fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
        (**self).send(request)
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
