// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Composition root tying the queue, monitor and driver together.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐   enqueue   ┌──────────────┐   persist   ┌───────────┐
//! │ OfflineManager │────────────►│ OfflineQueue │────────────►│  Storage  │
//! └────────────────┘             └──────────────┘             └───────────┘
//!    │        ▲                         ▲
//!    │        │ connected               │ drain
//!    ▼        │                         │
//! ┌────────────────┐   sync      ┌──────────────┐   send      ┌───────────┐
//! │ NetworkMonitor │────────────►│  SyncDriver  │────────────►│ Transport │
//! └────────────────┘             └──────────────┘             └───────────┘
//! ```
//!
//! The monitor holds only a weak reference back to the manager, so dropping
//! the last manager handle tears everything down.

use std::sync::{Arc, Mutex, Weak};

use minder_core::{
    system_clock, Config, HttpMethod, NetworkState, QueuedRequest, RequestOptions, SharedClock,
    Transition,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::driver::{authorize, SyncDriver, SyncOutcome};
use crate::error::Result;
use crate::events::{ConflictResolver, NoopEvents, OfflineEvents};
use crate::network::{NetworkMonitor, NetworkProbe};
use crate::queue::OfflineQueue;
use crate::storage::Storage;
use crate::token::CredentialSource;
use crate::transport::{Transport, TransportRequest, TransportResponse};

/// What [`OfflineManager::send_or_queue`] did with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Delivered live.
    Sent(TransportResponse),
    /// Queued for a later sync under this id.
    Queued(String),
}

/// Builder for [`OfflineManager`].
///
/// Without a [`probe`](Self::probe) the manager never discovers connectivity
/// on its own. It starts from [`initial_network_state`](Self::initial_network_state),
/// disconnected unless set, and only moves when the host calls
/// [`OfflineManager::set_network_state`]. Until then `sync` reports offline
/// and `send_or_queue` queues everything.
pub struct OfflineManagerBuilder {
    transport: Arc<dyn Transport>,
    config: Config,
    storage: Option<Arc<dyn Storage>>,
    probe: Option<Arc<dyn NetworkProbe>>,
    initial_state: NetworkState,
    events: Arc<dyn OfflineEvents>,
    resolver: Option<Arc<dyn ConflictResolver>>,
    credentials: Option<Arc<dyn CredentialSource>>,
    clock: SharedClock,
}

impl OfflineManagerBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn NetworkProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Connectivity assumed until the first probe or explicit update.
    ///
    /// Starting connected does not trigger an auto sync; call
    /// [`OfflineManager::sync`] to replay a restored queue.
    pub fn initial_network_state(mut self, state: NetworkState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn events(mut self, events: Arc<dyn OfflineEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn conflict_resolver(mut self, resolver: Arc<dyn ConflictResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn credentials(mut self, credentials: Arc<dyn CredentialSource>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Assemble the manager.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<Arc<OfflineManager>> {
        self.config.validate()?;

        let queue = Arc::new(
            OfflineQueue::new(&self.config.offline, self.storage, self.clock)
                .with_events(self.events.clone()),
        );

        let mut driver = SyncDriver::new(queue.clone(), self.transport.clone())
            .with_config(&self.config.offline, &self.config.token)
            .with_events(self.events.clone());
        if let Some(credentials) = &self.credentials {
            driver = driver.with_credentials(credentials.clone());
        }
        if let Some(resolver) = self.resolver {
            driver = driver.with_conflict_resolver(resolver);
        }

        let monitor = Arc::new(NetworkMonitor::with_initial_state(self.probe, self.initial_state));
        let config = self.config;
        let events = self.events;
        let auto_sync = config.offline.auto_sync;

        Ok(Arc::new_cyclic(|weak: &Weak<OfflineManager>| {
            let weak = weak.clone();
            let listener_events = events.clone();
            monitor.add_listener(move |state, transition| {
                listener_events.on_network_change(state);
                if transition == Transition::Connected && auto_sync {
                    spawn_auto_sync(&weak);
                }
            });

            OfflineManager {
                config,
                monitor,
                queue,
                driver,
                transport: self.transport,
                credentials: self.credentials,
                cancel: CancellationToken::new(),
                tasks: Mutex::new(Vec::new()),
            }
        }))
    }
}

fn spawn_auto_sync(manager: &Weak<OfflineManager>) {
    let Some(manager) = manager.upgrade() else {
        return;
    };
    if manager.queue.is_empty() {
        return;
    }
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        warn!("no async runtime, skipping auto sync");
        return;
    };
    debug!("connection restored, starting auto sync");
    handle.spawn(async move {
        manager.sync().await;
    });
}

/// Offline-first request handling.
///
/// Obtain one through [`OfflineManager::builder`].
pub struct OfflineManager {
    config: Config,
    monitor: Arc<NetworkMonitor>,
    queue: Arc<OfflineQueue>,
    driver: SyncDriver,
    transport: Arc<dyn Transport>,
    credentials: Option<Arc<dyn CredentialSource>>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl OfflineManager {
    pub fn builder(transport: impl Transport + 'static) -> OfflineManagerBuilder {
        Self::builder_shared(Arc::new(transport))
    }

    /// Like [`builder`](Self::builder) for a transport that is already shared.
    pub fn builder_shared(transport: Arc<dyn Transport>) -> OfflineManagerBuilder {
        OfflineManagerBuilder {
            transport,
            config: Config::default(),
            storage: None,
            probe: None,
            initial_state: NetworkState::offline(),
            events: Arc::new(NoopEvents),
            resolver: None,
            credentials: None,
            clock: system_clock(),
        }
    }

    /// Restore the persisted queue, probe connectivity and start polling.
    ///
    /// Returns the number of restored requests. If the first probe finds the
    /// network up and auto-sync is enabled, the restored queue is replayed.
    pub async fn start(&self) -> usize {
        let restored = self.queue.restore().await;
        info!(restored, "offline manager started");

        self.monitor.check_network_state().await;

        if let Some(interval) = self.config.network.poll_interval() {
            let handle = self.monitor.spawn_polling(interval, self.cancel.child_token());
            self.tasks.lock().unwrap_or_else(|e| e.into_inner()).push(handle);
        }
        restored
    }

    /// Stop background polling. In-flight syncs run to completion.
    pub fn shutdown(&self) {
        self.cancel.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(|e| e.into_inner()));
        for task in tasks {
            task.abort();
        }
        debug!("offline manager shut down");
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    pub fn monitor(&self) -> &Arc<NetworkMonitor> {
        &self.monitor
    }

    /// Enqueue a request for later replay and return its id.
    pub async fn add_to_queue(
        &self,
        method: HttpMethod,
        url: impl Into<String>,
        options: RequestOptions,
    ) -> Result<String> {
        Ok(self.queue.add_to_queue(method, url, options).await?)
    }

    pub async fn remove_from_queue(&self, id: &str) -> bool {
        self.queue.remove_from_queue(id).await
    }

    pub fn get_queue(&self) -> Vec<QueuedRequest> {
        self.queue.get_queue()
    }

    pub async fn clear_queue(&self) {
        self.queue.clear_queue().await;
    }

    /// Replay the queue. Skipped while offline.
    pub async fn sync(&self) -> SyncOutcome {
        if !self.monitor.is_online() {
            debug!("offline, skipping sync");
            return SyncOutcome::Offline;
        }
        self.driver.sync().await
    }

    pub fn is_syncing(&self) -> bool {
        self.driver.is_syncing()
    }

    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    pub fn network_state(&self) -> NetworkState {
        self.monitor.state()
    }

    pub async fn check_network_state(&self) -> NetworkState {
        self.monitor.check_network_state().await
    }

    /// Push a connectivity change from a platform event.
    pub fn set_network_state(&self, state: NetworkState) {
        self.monitor.update(state);
    }

    /// Send now if online, otherwise queue.
    ///
    /// A live attempt that fails with a retryable error is queued too.
    ///
    /// # Errors
    ///
    /// Returns the transport error for permanent failures, and queue errors
    /// for invalid input.
    pub async fn send_or_queue(
        &self,
        method: HttpMethod,
        url: impl Into<String>,
        options: RequestOptions,
    ) -> Result<Delivery> {
        let url = url.into();
        if !self.monitor.is_online() {
            let id = self.add_to_queue(method, url, options).await?;
            return Ok(Delivery::Queued(id));
        }

        let mut request = TransportRequest::new(method, url.clone());
        request.headers = options.headers.clone();
        request.body = options.body.clone();
        authorize(&mut request, self.credentials.as_deref(), &self.config.token);

        match self.transport.send(request).await {
            Ok(response) => Ok(Delivery::Sent(response)),
            Err(e) if e.is_retryable() => {
                info!(url = %url, error = %e, "live request failed, queueing");
                let id = self.add_to_queue(method, url, options).await?;
                Ok(Delivery::Queued(id))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for OfflineManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
