// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the sync engine tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use minder_core::{ClockSource, NetworkState, QueuedRequest, SyncStats};
use tokio::sync::Notify;

use crate::events::{OfflineEvents, TokenEvents};
use crate::network::{NetworkProbe, ProbeFuture};
use crate::storage::{Storage, StorageError, StorageFuture};
use crate::token::TokenError;
use crate::transport::{
    Transport, TransportError, TransportFuture, TransportRequest, TransportResponse,
    TransportResult,
};

/// Fixed starting point for mock clocks: 2023-11-14T22:13:20Z.
pub const T0_MS: u64 = 1_700_000_000_000;

/// Clock that only moves when told to.
pub struct MockClock {
    now_ms: AtomicU64,
}

impl MockClock {
    pub fn new(now_ms: u64) -> Arc<Self> {
        Arc::new(MockClock { now_ms: AtomicU64::new(now_ms) })
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl ClockSource for MockClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Build an unsigned JWT whose `exp` claim is `exp_ms` rounded down to seconds.
pub fn make_token(exp_ms: u64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD
        .encode(serde_json::json!({ "sub": "user-1", "exp": exp_ms / 1000 }).to_string());
    format!("{header}.{payload}.signature")
}

/// Scripted transport that records every request.
///
/// Responses are consumed per URL in order; once a URL's script is empty
/// the default outcome applies (200 OK unless changed with [`fail_all`](Self::fail_all)).
#[derive(Default)]
pub struct MockTransport {
    scripts: Mutex<HashMap<String, VecDeque<TransportResult<TransportResponse>>>>,
    default_error: Mutex<Option<TransportError>>,
    calls: Mutex<Vec<TransportRequest>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every response for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        MockTransport { delay: Some(delay), ..Self::default() }
    }

    pub fn push_response(&self, url: &str, result: TransportResult<TransportResponse>) {
        let mut scripts = self.scripts.lock().unwrap();
        scripts.entry(url.to_string()).or_default().push_back(result);
    }

    pub fn fail_all(&self, error: TransportError) {
        *self.default_error.lock().unwrap() = Some(error);
    }

    pub fn succeed_all(&self) {
        *self.default_error.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<TransportRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|r| r.url == url).count()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let url = request.url.clone();
            self.calls.lock().unwrap().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let scripted = self.scripts.lock().unwrap().get_mut(&url).and_then(VecDeque::pop_front);
            match scripted {
                Some(result) => result,
                None => match self.default_error.lock().unwrap().clone() {
                    Some(err) => Err(err),
                    None => Ok(TransportResponse::ok(200)),
                },
            }
        })
    }
}

/// Probe that reports whatever state it was last given.
pub struct MockProbe {
    state: Mutex<NetworkState>,
    probes: AtomicUsize,
}

impl MockProbe {
    pub fn new(state: NetworkState) -> Arc<Self> {
        Arc::new(MockProbe { state: Mutex::new(state), probes: AtomicUsize::new(0) })
    }

    pub fn set(&self, state: NetworkState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl NetworkProbe for MockProbe {
    fn probe(&self) -> ProbeFuture<'_> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let state = *self.state.lock().unwrap();
        Box::pin(async move { state })
    }
}

/// Storage whose every operation fails.
pub struct BrokenStorage;

impl Storage for BrokenStorage {
    fn get_item<'a>(&'a self, _key: &'a str) -> StorageFuture<'a, Option<String>> {
        Box::pin(async { Err(StorageError::Unavailable("disk on fire".into())) })
    }

    fn set_item<'a>(&'a self, _key: &'a str, _value: String) -> StorageFuture<'a, ()> {
        Box::pin(async { Err(StorageError::Unavailable("disk on fire".into())) })
    }

    fn remove_item<'a>(&'a self, _key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async { Err(StorageError::Unavailable("disk on fire".into())) })
    }
}

/// Every callback observed by [`RecordingEvents`], in firing order.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Queued(String),
    Evicted(String),
    Success(String),
    Error(String),
    SyncStart,
    SyncComplete(SyncStats),
    NetworkChange(bool),
    TokenRefreshed(String),
    RefreshError(String),
}

/// Events sink that records callbacks and wakes waiters on sync completion.
#[derive(Default)]
pub struct RecordingEvents {
    log: Mutex<Vec<Recorded>>,
    sync_done: Notify,
}

impl RecordingEvents {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn log(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Recorded) -> bool) -> usize {
        self.log.lock().unwrap().iter().filter(|e| pred(e)).count()
    }

    pub fn completed_syncs(&self) -> Vec<SyncStats> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Recorded::SyncComplete(stats) => Some(stats.clone()),
                _ => None,
            })
            .collect()
    }

    /// Wait until the next `on_sync_complete`.
    pub async fn wait_for_sync(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.sync_done.notified())
            .await
            .expect("sync did not complete");
    }

    fn push(&self, event: Recorded) {
        self.log.lock().unwrap().push(event);
    }
}

impl OfflineEvents for RecordingEvents {
    fn on_request_queued(&self, request: &QueuedRequest) {
        self.push(Recorded::Queued(request.id.clone()));
    }

    fn on_request_evicted(&self, request: &QueuedRequest) {
        self.push(Recorded::Evicted(request.id.clone()));
    }

    fn on_request_success(&self, request: &QueuedRequest, _response: &TransportResponse) {
        self.push(Recorded::Success(request.id.clone()));
    }

    fn on_request_error(&self, request: &QueuedRequest, _error: &TransportError) {
        self.push(Recorded::Error(request.id.clone()));
    }

    fn on_sync_start(&self) {
        self.push(Recorded::SyncStart);
    }

    fn on_sync_complete(&self, stats: &SyncStats) {
        self.push(Recorded::SyncComplete(stats.clone()));
        self.sync_done.notify_one();
    }

    fn on_network_change(&self, state: &NetworkState) {
        self.push(Recorded::NetworkChange(state.is_connected));
    }
}

impl TokenEvents for RecordingEvents {
    fn on_token_refreshed(&self, token: &str) {
        self.push(Recorded::TokenRefreshed(token.to_string()));
    }

    fn on_refresh_error(&self, error: &TokenError) {
        self.push(Recorded::RefreshError(error.to_string()));
    }
}
