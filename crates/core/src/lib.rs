// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! minder-core: Shared data model for the minder offline engine
//!
//! This crate provides the request, network and statistics types, token
//! claim decoding, configuration, and primitives used by both the
//! `minder-sync` engine and the `minder` CLI. It performs no I/O.

pub mod clock;
pub mod config;
pub mod conflict;
pub mod error;
pub mod id;
pub mod jwt;
pub mod network;
pub mod request;
pub mod stats;

pub use clock::{system_clock, ClockSource, SharedClock, SystemClock};
pub use config::{Config, NetworkConfig, OfflineConfig, TokenConfig, TransportConfig};
pub use conflict::{ConflictPolicy, ConflictResolution};
pub use error::{Error, Result};
pub use network::{ConnectionType, NetworkState, Transition};
pub use request::{HttpMethod, QueuedRequest, RequestOptions};
pub use stats::{SyncFailure, SyncStats};
