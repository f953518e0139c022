// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync driver: replays the offline queue.
//!
//! A pass snapshots the queue in priority order and dispatches it in
//! batches. Requests within a batch run concurrently; batches run one after
//! another. Each request is attempted at most once per pass:
//! - success removes it
//! - a retryable failure keeps it with its retry count bumped
//! - a permanent failure, or a retry count past the budget, removes it
//!
//! Only one pass runs at a time. The guard is released on drop, so a
//! cancelled pass frees it too.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use minder_core::{
    ConflictPolicy, ConflictResolution, OfflineConfig, QueuedRequest, SyncFailure, SyncStats,
    TokenConfig,
};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::events::{ConflictResolver, NoopEvents, OfflineEvents};
use crate::queue::OfflineQueue;
use crate::token::CredentialSource;
use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};

/// Result of [`SyncDriver::sync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The pass ran to completion.
    Completed(SyncStats),
    /// Another pass was already running; nothing was done.
    AlreadyRunning,
    /// The network is down; nothing was done.
    Offline,
}

impl SyncOutcome {
    pub fn stats(&self) -> Option<&SyncStats> {
        match self {
            SyncOutcome::Completed(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn into_stats(self) -> Option<SyncStats> {
        match self {
            SyncOutcome::Completed(stats) => Some(stats),
            _ => None,
        }
    }
}

/// How a single replay ended.
enum Replay {
    Delivered(TransportResponse),
    Discarded,
    Deferred,
    Failed(TransportError),
}

/// Clears the in-progress flag when dropped.
struct SyncGuard<'a>(&'a AtomicBool);

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).ok()?;
        Some(SyncGuard(flag))
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Replays queued requests through a [`Transport`].
pub struct SyncDriver {
    queue: Arc<OfflineQueue>,
    transport: Arc<dyn Transport>,
    events: Arc<dyn OfflineEvents>,
    credentials: Option<Arc<dyn CredentialSource>>,
    resolver: Option<Arc<dyn ConflictResolver>>,
    policy: ConflictPolicy,
    batch_size: usize,
    token: TokenConfig,
    running: AtomicBool,
}

impl SyncDriver {
    pub fn new(queue: Arc<OfflineQueue>, transport: Arc<dyn Transport>) -> Self {
        let offline = OfflineConfig::default();
        SyncDriver {
            queue,
            transport,
            events: Arc::new(NoopEvents),
            credentials: None,
            resolver: None,
            policy: offline.conflict_policy,
            batch_size: offline.batch_size,
            token: TokenConfig::default(),
            running: AtomicBool::new(false),
        }
    }

    /// Apply batch size and conflict policy from `offline`, and header
    /// rendering from `token`.
    pub fn with_config(mut self, offline: &OfflineConfig, token: &TokenConfig) -> Self {
        self.batch_size = offline.batch_size.max(1);
        self.policy = offline.conflict_policy;
        self.token = token.clone();
        self
    }

    pub fn with_events(mut self, events: Arc<dyn OfflineEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_conflict_resolver(mut self, resolver: Arc<dyn ConflictResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn is_syncing(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one pass over the queue.
    pub async fn sync(&self) -> SyncOutcome {
        let Some(_guard) = SyncGuard::acquire(&self.running) else {
            debug!("sync already running");
            return SyncOutcome::AlreadyRunning;
        };

        let started = Instant::now();
        self.events.on_sync_start();

        self.queue.load().await;
        let snapshot = self.queue.get_queue();
        let mut stats = SyncStats { total: snapshot.len(), ..SyncStats::default() };
        info!(total = stats.total, batch_size = self.batch_size, "sync started");

        let mut credential_renewed = false;
        for batch in snapshot.chunks(self.batch_size) {
            let replays = join_all(batch.iter().map(|request| self.replay(request))).await;

            let mut unauthorized = false;
            for (request, replay) in batch.iter().zip(replays) {
                unauthorized |= self.apply(request, replay, &mut stats);
            }

            if unauthorized && !credential_renewed {
                if let Some(credentials) = &self.credentials {
                    info!("server rejected credential, requesting refresh");
                    credentials.on_unauthorized().await;
                    credential_renewed = true;
                }
            }
        }

        self.queue.persist().await;
        stats.pending = self.queue.len();
        stats.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            total = stats.total,
            successful = stats.successful,
            failed = stats.failed,
            discarded = stats.discarded,
            deferred = stats.deferred,
            pending = stats.pending,
            duration_ms = stats.duration_ms,
            "sync complete"
        );
        self.events.on_sync_complete(&stats);
        SyncOutcome::Completed(stats)
    }

    /// Build the outbound request, with the current credential in the auth header.
    pub fn outbound(&self, request: &QueuedRequest) -> TransportRequest {
        let mut outbound = TransportRequest::from_queued(request);
        authorize(&mut outbound, self.credentials.as_deref(), &self.token);
        outbound
    }

    async fn replay(&self, request: &QueuedRequest) -> Replay {
        let outbound = self.outbound(request);
        debug!(id = %request.id, method = %request.method, url = %request.url, "replaying request");

        match self.transport.send(outbound.clone()).await {
            Ok(response) => match response.conflict.clone() {
                None => Replay::Delivered(response),
                Some(server_state) => self.resolve_conflict(request, outbound, server_state).await,
            },
            Err(e) => Replay::Failed(e),
        }
    }

    async fn resolve_conflict(
        &self,
        request: &QueuedRequest,
        mut outbound: TransportRequest,
        server_state: Value,
    ) -> Replay {
        let resolution = match Option::<ConflictResolution>::from(self.policy) {
            Some(resolution) => resolution,
            None => match &self.resolver {
                Some(resolver) => resolver.on_conflict(request, &server_state).await,
                None => {
                    warn!(id = %request.id, "conflict under manual policy with no resolver, deferring");
                    ConflictResolution::Defer
                }
            },
        };
        debug!(id = %request.id, ?resolution, "conflict resolved");

        match resolution {
            ConflictResolution::UseServer => Replay::Discarded,
            ConflictResolution::Defer => Replay::Deferred,
            ConflictResolution::UseClient => {
                outbound.overwrite = true;
                match self.transport.send(outbound).await {
                    Ok(response) if response.conflict.is_none() => Replay::Delivered(response),
                    Ok(_) => Replay::Failed(TransportError::status(
                        409,
                        "conflict persisted after overwrite",
                    )),
                    Err(e) => Replay::Failed(e),
                }
            }
        }
    }

    /// Record one replay. Returns true if the server rejected the credential.
    fn apply(&self, request: &QueuedRequest, replay: Replay, stats: &mut SyncStats) -> bool {
        match replay {
            Replay::Delivered(response) => {
                self.queue.take(&request.id);
                stats.successful += 1;
                debug!(id = %request.id, status = response.status, "request delivered");
                self.events.on_request_success(request, &response);
                false
            }
            Replay::Discarded => {
                self.queue.take(&request.id);
                stats.discarded += 1;
                info!(id = %request.id, "conflict resolved for server, dropped queued change");
                false
            }
            Replay::Deferred => {
                stats.deferred += 1;
                false
            }
            Replay::Failed(error) => {
                stats.failed += 1;
                stats.errors.push(SyncFailure {
                    request_id: request.id.clone(),
                    error: error.to_string(),
                });

                // Removed by someone else mid-pass
                let Some(updated) = self.queue.mark_failed(&request.id, error.to_string()) else {
                    return error.is_unauthorized();
                };
                if updated.is_exhausted() || !error.is_retryable() {
                    self.queue.take(&request.id);
                    warn!(
                        id = %updated.id,
                        retries = updated.retry_count,
                        error = %error,
                        "request failed permanently"
                    );
                    self.events.on_request_error(&updated, &error);
                } else {
                    debug!(id = %updated.id, retries = updated.retry_count, error = %error, "request will retry");
                }
                error.is_unauthorized()
            }
        }
    }
}

/// Write the current credential into the configured auth header.
///
/// Replaces any stored value for that header, whatever its case.
pub(crate) fn authorize(
    request: &mut TransportRequest,
    credentials: Option<&dyn CredentialSource>,
    token_config: &TokenConfig,
) {
    let Some(token) = credentials.and_then(|c| c.current_token()) else {
        return;
    };
    let header = &token_config.auth_header;
    request.headers.retain(|name, _| !name.eq_ignore_ascii_case(header));
    request.headers.insert(header.clone(), token_config.header_value(&token));
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
