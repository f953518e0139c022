// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline queue for requests deferred while disconnected.
//!
//! The in-memory list is the source of truth for the process. Every change
//! is written through to the optional [`Storage`] as a JSON array under one
//! key; write failures are logged and never fail the operation.
//!
//! Persisted requests are loaded once, before the first write, and merged
//! with anything queued in memory before that. A write can therefore never
//! replace a stored queue that has not been read yet.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

use minder_core::id::generate_unique_id;
use minder_core::request::sort_queue;
use minder_core::{
    Error, HttpMethod, OfflineConfig, QueuedRequest, RequestOptions, Result, SharedClock,
};
use tracing::{debug, warn};

use crate::events::{NoopEvents, OfflineEvents};
use crate::storage::Storage;

/// Ordered, bounded list of pending requests.
pub struct OfflineQueue {
    items: Mutex<Vec<QueuedRequest>>,
    storage: Option<Arc<dyn Storage>>,
    storage_key: String,
    max_size: usize,
    default_max_retries: u32,
    clock: SharedClock,
    events: Arc<dyn OfflineEvents>,
    seq: AtomicU64,
    /// Serializes storage writes so a stale snapshot never lands last.
    persist_lock: tokio::sync::Mutex<()>,
    loaded: tokio::sync::OnceCell<()>,
}

impl OfflineQueue {
    pub fn new(config: &OfflineConfig, storage: Option<Arc<dyn Storage>>, clock: SharedClock) -> Self {
        OfflineQueue {
            items: Mutex::new(Vec::new()),
            storage,
            storage_key: config.storage_key.clone(),
            max_size: config.max_queue_size.max(1),
            default_max_retries: config.max_retries,
            clock,
            events: Arc::new(NoopEvents),
            seq: AtomicU64::new(0),
            persist_lock: tokio::sync::Mutex::new(()),
            loaded: tokio::sync::OnceCell::new(),
        }
    }

    /// Attach an events sink.
    pub fn with_events(mut self, events: Arc<dyn OfflineEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    fn items(&self) -> std::sync::MutexGuard<'_, Vec<QueuedRequest>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enqueue a request and return its id.
    ///
    /// At capacity, the oldest request of the lowest priority already in the
    /// queue is evicted first. The new request is never the one evicted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `url` is blank.
    pub async fn add_to_queue(
        &self,
        method: HttpMethod,
        url: impl Into<String>,
        options: RequestOptions,
    ) -> Result<String> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(Error::InvalidInput("request URL must not be empty".into()));
        }

        self.load().await;
        let now = self.clock.now_ms();
        let (request, evicted) = {
            let mut items = self.items();
            let seq = self.seq.fetch_add(1, AtomicOrdering::Relaxed);
            let id = generate_unique_id(method, &url, now, seq, |candidate| {
                items.iter().any(|r| r.id == candidate)
            });
            let request =
                QueuedRequest::new(id, method, url, options, self.default_max_retries, now);

            let evicted = evict_to(&mut items, self.max_size - 1);

            let position = items.partition_point(|r| {
                QueuedRequest::queue_order(r, &request) != std::cmp::Ordering::Greater
            });
            items.insert(position, request.clone());
            (request, evicted)
        };

        self.report_evicted(&evicted);
        debug!(id = %request.id, method = %request.method, url = %request.url, "request queued");
        self.events.on_request_queued(&request);

        self.persist().await;
        Ok(request.id)
    }

    /// Remove a request by id. Returns false if it was not queued.
    pub async fn remove_from_queue(&self, id: &str) -> bool {
        self.load().await;
        if self.take(id).is_none() {
            return false;
        }
        self.persist().await;
        true
    }

    /// Ordered snapshot of the queue.
    ///
    /// Before [`load`](Self::load) or [`restore`](Self::restore) has run this
    /// only holds requests queued by this process.
    pub fn get_queue(&self) -> Vec<QueuedRequest> {
        self.items().clone()
    }

    pub fn get(&self, id: &str) -> Option<QueuedRequest> {
        self.items().iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Drop every request and persist the empty queue.
    pub async fn clear_queue(&self) {
        self.load().await;
        self.items().clear();
        self.persist().await;
    }

    /// Load the persisted queue if it has not been loaded yet.
    ///
    /// Every mutation and every sync pass awaits this first.
    pub async fn load(&self) {
        self.loaded.get_or_init(|| self.merge_persisted()).await;
    }

    /// Merge the persisted queue into memory and return the queue length.
    ///
    /// Requests already in memory win over persisted ones with the same id.
    /// Without storage this does nothing; unreadable or malformed data is
    /// treated as an empty stored queue.
    pub async fn restore(&self) -> usize {
        if self.loaded.initialized() {
            self.merge_persisted().await;
        } else {
            self.load().await;
        }
        self.len()
    }

    async fn merge_persisted(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let _guard = self.persist_lock.lock().await;

        let persisted = match storage.get_item(&self.storage_key).await {
            Ok(Some(raw)) => parse_persisted(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %self.storage_key, error = %e, "failed to read persisted queue");
                Vec::new()
            }
        };

        let count = persisted.len();
        let evicted = {
            let mut items = self.items();
            let known: HashSet<String> = items.iter().map(|r| r.id.clone()).collect();
            items.extend(persisted.into_iter().filter(|r| !known.contains(&r.id)));
            sort_queue(&mut items);
            evict_to(&mut items, self.max_size)
        };
        self.report_evicted(&evicted);
        debug!(count, "persisted queue loaded");
    }

    fn report_evicted(&self, evicted: &[QueuedRequest]) {
        for dropped in evicted {
            warn!(
                id = %dropped.id,
                priority = dropped.priority,
                capacity = self.max_size,
                "queue full, evicted request"
            );
            self.events.on_request_evicted(dropped);
        }
    }

    /// Write the current queue to storage. Failures are logged.
    pub async fn persist(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        self.load().await;
        let _guard = self.persist_lock.lock().await;

        let snapshot = self.get_queue();
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize queue");
                return;
            }
        };
        if let Err(e) = storage.set_item(&self.storage_key, json).await {
            warn!(key = %self.storage_key, error = %e, "failed to persist queue");
        }
    }

    /// Record a failed attempt on a queued request.
    ///
    /// Returns the updated request, or `None` if it is no longer queued.
    /// Does not persist.
    pub fn mark_failed(&self, id: &str, error: impl Into<String>) -> Option<QueuedRequest> {
        let mut items = self.items();
        let request = items.iter_mut().find(|r| r.id == id)?;
        request.record_failure(error);
        Some(request.clone())
    }

    /// Remove a request without persisting.
    pub fn take(&self, id: &str) -> Option<QueuedRequest> {
        let mut items = self.items();
        let index = items.iter().position(|r| r.id == id)?;
        Some(items.remove(index))
    }
}

/// First request of the lowest priority tier in a sorted queue, which is
/// the oldest one in that tier.
fn eviction_index(items: &[QueuedRequest]) -> Option<usize> {
    let lowest = items.iter().map(|r| r.priority).min()?;
    items.iter().position(|r| r.priority == lowest)
}

/// Evict until at most `limit` requests remain.
fn evict_to(items: &mut Vec<QueuedRequest>, limit: usize) -> Vec<QueuedRequest> {
    let mut evicted = Vec::new();
    while items.len() > limit {
        match eviction_index(items) {
            Some(index) => evicted.push(items.remove(index)),
            None => break,
        }
    }
    evicted
}

fn parse_persisted(raw: &str) -> Vec<QueuedRequest> {
    let mut requests: Vec<QueuedRequest> = match serde_json::from_str(raw) {
        Ok(requests) => requests,
        Err(e) => {
            warn!(error = %e, "persisted queue is malformed, starting empty");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    requests.retain(|r| {
        let fresh = seen.insert(r.id.clone());
        if !fresh {
            warn!(id = %r.id, "dropping duplicate persisted request");
        }
        fresh
    });
    sort_queue(&mut requests);
    requests
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
