// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! minder-sync: Offline request queue and sync engine
//!
//! Queues mutations while the network is down, replays them in priority
//! order when it returns, and keeps a bearer token renewed ahead of expiry.
//!
//! # Features
//!
//! - Bounded, priority-ordered offline queue with pluggable persistence
//! - Batched replay with retry budgets and conflict policies
//! - Connectivity tracking by probe, push, or polling
//! - Token renewal scheduler with at most one refresh in flight
//! - Injectable transport, storage, probe and clock for testing

pub mod driver;
pub mod error;
pub mod events;
pub mod http;
pub mod manager;
pub mod network;
pub mod queue;
pub mod storage;
pub mod token;
pub mod transport;

pub use driver::{SyncDriver, SyncOutcome};
pub use error::{Error, Result};
pub use events::{ConflictResolver, NoopEvents, OfflineEvents, TokenEvents};
pub use http::HttpTransport;
pub use manager::{Delivery, OfflineManager, OfflineManagerBuilder};
pub use network::{NetworkMonitor, NetworkProbe, TcpProbe};
pub use queue::OfflineQueue;
pub use storage::{FileStorage, MemoryStorage, SqliteStorage, Storage, StorageError};
pub use token::{
    BoxError, CredentialSource, RefreshState, StaticCredential, TokenError, TokenRefreshManager,
    TokenRefresher,
};
pub use transport::{Transport, TransportError, TransportRequest, TransportResponse};

#[cfg(test)]
mod test_helpers;
