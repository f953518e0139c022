// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport built on `reqwest`.

use std::fmt;
use std::sync::Mutex;

use minder_core::{HttpMethod, TransportConfig};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::transport::{
    Transport, TransportError, TransportFuture, TransportRequest, TransportResponse,
    TransportResult,
};

/// Header sent when a replay should overwrite server state.
pub const CONFLICT_RESOLUTION_HEADER: &str = "X-Conflict-Resolution";

/// Longest error body echoed into a [`TransportError::Status`] message.
const MAX_ERROR_BODY: usize = 200;

/// Sends requests over HTTP(S).
///
/// Relative URLs are resolved against the configured base URL. A `409
/// Conflict` answer is delivered as a response carrying the server body as
/// its conflict payload; every other non-2xx status is an error.
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
    cancel: Mutex<CancellationToken>,
}

impl HttpTransport {
    /// Create a transport from configuration.
    pub fn new(config: TransportConfig) -> TransportResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TransportError::ConnectionFailed(format!("failed to build HTTP client: {e}")))?;
        Ok(HttpTransport { client, config, cancel: Mutex::new(CancellationToken::new()) })
    }

    /// Abort every request currently in flight.
    ///
    /// Aborted requests fail with [`TransportError::Cancelled`]. Requests
    /// sent afterwards are unaffected.
    pub fn cancel_all(&self) {
        let mut cancel = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
        cancel.cancel();
        *cancel = CancellationToken::new();
    }

    fn cancel_token(&self) -> CancellationToken {
        self.cancel.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn execute(&self, request: TransportRequest) -> TransportResult<TransportResponse> {
        let cancel = self.cancel_token();
        let url = self.config.resolve_url(&request.url);
        debug!(method = %request.method, url = %url, "sending request");

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), &url)
            .timeout(request.timeout.unwrap_or_else(|| self.config.timeout()));
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if request.overwrite {
            builder = builder.header(CONFLICT_RESOLUTION_HEADER, "client-wins");
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = builder.send() => result.map_err(classify)?,
        };

        let status = response.status();
        let bytes = tokio::select! {
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = response.bytes() => result.map_err(classify)?,
        };

        if status == StatusCode::CONFLICT {
            let server_state = parse_body(&bytes).unwrap_or(Value::Null);
            return Ok(TransportResponse::conflict(server_state));
        }
        if !status.is_success() {
            return Err(TransportError::status(status.as_u16(), error_message(status, &bytes)));
        }
        Ok(TransportResponse { status: status.as_u16(), body: parse_body(&bytes), conflict: None })
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport").field("config", &self.config).finish()
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
        Box::pin(self.execute(request))
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_builder() {
        TransportError::Rejected(err.to_string())
    } else {
        TransportError::ConnectionFailed(err.to_string())
    }
}

/// Parses a response body as JSON, falling back to a string value.
fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    Some(
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
    )
}

fn error_message(status: StatusCode, bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.is_empty() {
        return status.canonical_reason().unwrap_or("unexpected status").to_string();
    }
    text.chars().take(MAX_ERROR_BODY).collect()
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
