// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network state monitor.
//!
//! Tracks the last known connectivity snapshot and notifies listeners when
//! it crosses the connected/disconnected boundary. State arrives two ways:
//! - active probing through a [`NetworkProbe`] ([`NetworkMonitor::check_network_state`])
//! - pushed updates from platform connectivity events ([`NetworkMonitor::update`])

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use futures_util::future::select_ok;
use minder_core::{ConnectionType, NetworkConfig, NetworkState, Transition};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Boxed future returned by [`NetworkProbe::probe`].
pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = NetworkState> + Send + 'a>>;

/// Determines current connectivity.
pub trait NetworkProbe: Send + Sync {
    fn probe(&self) -> ProbeFuture<'_>;
}

/// Reachability check by TCP connect.
///
/// Reports online when any target accepts a connection within the timeout.
/// The link type cannot be observed this way and is reported as unknown.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    hosts: Vec<String>,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(hosts: Vec<String>, timeout: Duration) -> Self {
        TcpProbe { hosts, timeout }
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        TcpProbe::new(config.probe_hosts.clone(), config.probe_timeout())
    }

    async fn reachable(&self) -> bool {
        if self.hosts.is_empty() {
            return false;
        }
        let attempts = self.hosts.iter().map(|host| {
            let timeout = self.timeout;
            Box::pin(async move {
                match tokio::time::timeout(timeout, TcpStream::connect(host.as_str())).await {
                    Ok(Ok(_)) => Ok(()),
                    Ok(Err(e)) => {
                        debug!(host = %host, error = %e, "probe failed");
                        Err(())
                    }
                    Err(_) => {
                        debug!(host = %host, "probe timed out");
                        Err(())
                    }
                }
            })
        });
        select_ok(attempts).await.is_ok()
    }
}

impl NetworkProbe for TcpProbe {
    fn probe(&self) -> ProbeFuture<'_> {
        Box::pin(async move {
            if self.reachable().await {
                NetworkState::online(ConnectionType::Unknown)
            } else {
                NetworkState::offline()
            }
        })
    }
}

type Listener = Arc<dyn Fn(&NetworkState, Transition) + Send + Sync>;

/// Holds the cached connectivity state and its observers.
pub struct NetworkMonitor {
    probe: Option<Arc<dyn NetworkProbe>>,
    state: watch::Sender<NetworkState>,
    listeners: Mutex<Vec<Listener>>,
}

impl NetworkMonitor {
    /// Create a monitor. Without a probe, state only changes through [`update`](Self::update).
    ///
    /// The initial state is disconnected until the first probe or update.
    pub fn new(probe: Option<Arc<dyn NetworkProbe>>) -> Self {
        Self::with_initial_state(probe, NetworkState::offline())
    }

    /// Create a monitor that starts from `initial` instead of disconnected.
    pub fn with_initial_state(probe: Option<Arc<dyn NetworkProbe>>, initial: NetworkState) -> Self {
        let (state, _) = watch::channel(initial);
        NetworkMonitor { probe, state, listeners: Mutex::new(Vec::new()) }
    }

    /// Last known state. Never probes.
    pub fn state(&self) -> NetworkState {
        *self.state.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.state.borrow().is_connected
    }

    /// Register a callback for boundary crossings.
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&NetworkState, Transition) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.push(Arc::new(listener));
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<NetworkState> {
        self.state.subscribe()
    }

    /// Probe connectivity and apply the result.
    ///
    /// Without a probe, returns the cached state.
    pub async fn check_network_state(&self) -> NetworkState {
        let Some(probe) = self.probe.clone() else {
            return self.state();
        };
        let next = probe.probe().await;
        self.update(next);
        next
    }

    /// Apply a pushed state.
    ///
    /// Listeners fire only when the connected flag flips; subscribers see
    /// any change.
    pub fn update(&self, next: NetworkState) -> Option<Transition> {
        let mut previous = next;
        self.state.send_if_modified(|current| {
            previous = *current;
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });

        let transition = previous.transition_to(&next)?;
        match transition {
            Transition::Connected => info!(connection = %next.connection_type, "network connected"),
            Transition::Disconnected => info!("network disconnected"),
        }

        let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner()).clone();
        for listener in listeners {
            listener(&next, transition);
        }
        Some(transition)
    }

    /// Probe every `interval` until `cancel` fires or the monitor is dropped.
    pub fn spawn_polling(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let monitor: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately; the caller already probed.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("network polling cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        let Some(monitor) = monitor.upgrade() else {
                            break;
                        };
                        monitor.check_network_state().await;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
