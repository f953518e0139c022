// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle callbacks.
//!
//! Every hook has a no-op default, so hosts implement only what they observe.
//! Hooks fire synchronously on the task that triggered the event and must
//! not block.

use std::future::Future;
use std::pin::Pin;

use minder_core::{ConflictResolution, NetworkState, QueuedRequest, SyncStats};
use serde_json::Value;

use crate::token::TokenError;
use crate::transport::{TransportError, TransportResponse};

/// Observer for queue, sync and connectivity events.
pub trait OfflineEvents: Send + Sync {
    /// A request was added to the queue.
    fn on_request_queued(&self, _request: &QueuedRequest) {}

    /// A request was dropped to make room for a new one.
    fn on_request_evicted(&self, _request: &QueuedRequest) {}

    /// A replayed request was delivered and removed from the queue.
    fn on_request_success(&self, _request: &QueuedRequest, _response: &TransportResponse) {}

    /// A replayed request failed terminally and was removed from the queue.
    fn on_request_error(&self, _request: &QueuedRequest, _error: &TransportError) {}

    fn on_sync_start(&self) {}

    fn on_sync_complete(&self, _stats: &SyncStats) {}

    /// Connectivity crossed the connected/disconnected boundary.
    fn on_network_change(&self, _state: &NetworkState) {}
}

/// Events sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl OfflineEvents for NoopEvents {}

/// Observer for credential renewal.
pub trait TokenEvents: Send + Sync {
    /// A new token was stored. Fires once per successful renewal.
    fn on_token_refreshed(&self, _token: &str) {}

    /// A renewal attempt failed. The timer is left unarmed.
    fn on_refresh_error(&self, _error: &TokenError) {}
}

impl TokenEvents for NoopEvents {}

/// Boxed future returned by [`ConflictResolver::on_conflict`].
pub type ResolveFuture<'a> = Pin<Box<dyn Future<Output = ConflictResolution> + Send + 'a>>;

/// Decides conflicts under the manual policy.
pub trait ConflictResolver: Send + Sync {
    fn on_conflict<'a>(
        &'a self,
        request: &'a QueuedRequest,
        server_state: &'a Value,
    ) -> ResolveFuture<'a>;
}

impl<F> ConflictResolver for F
where
    F: Fn(&QueuedRequest, &Value) -> ConflictResolution + Send + Sync,
{
    fn on_conflict<'a>(
        &'a self,
        request: &'a QueuedRequest,
        server_state: &'a Value,
    ) -> ResolveFuture<'a> {
        let resolution = self(request, server_state);
        Box::pin(async move { resolution })
    }
}
