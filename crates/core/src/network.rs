// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Best-effort classification of the active network link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Wifi,
    Cellular,
    Ethernet,
    #[default]
    Unknown,
    None,
}

impl ConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Wifi => "wifi",
            ConnectionType::Cellular => "cellular",
            ConnectionType::Ethernet => "ethernet",
            ConnectionType::Unknown => "unknown",
            ConnectionType::None => "none",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last known connectivity snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkState {
    pub is_connected: bool,
    #[serde(rename = "type")]
    pub connection_type: ConnectionType,
    pub is_expensive: bool,
    pub is_metered: bool,
}

impl NetworkState {
    /// A connected state. Cellular links are reported as expensive and metered.
    pub fn online(connection_type: ConnectionType) -> Self {
        let cellular = connection_type == ConnectionType::Cellular;
        NetworkState { is_connected: true, connection_type, is_expensive: cellular, is_metered: cellular }
    }

    /// A disconnected state.
    pub fn offline() -> Self {
        NetworkState {
            is_connected: false,
            connection_type: ConnectionType::None,
            is_expensive: false,
            is_metered: false,
        }
    }

    /// Classifies the move from `self` to `next` across the connected boundary.
    pub fn transition_to(&self, next: &NetworkState) -> Option<Transition> {
        match (self.is_connected, next.is_connected) {
            (false, true) => Some(Transition::Connected),
            (true, false) => Some(Transition::Disconnected),
            _ => None,
        }
    }
}

impl Default for NetworkState {
    fn default() -> Self {
        NetworkState::offline()
    }
}

/// A crossing of the connected/disconnected boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// DISCONNECTED → CONNECTED. The only transition that triggers sync.
    Connected,
    /// CONNECTED → DISCONNECTED.
    Disconnected,
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
