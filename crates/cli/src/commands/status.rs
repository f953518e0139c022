// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use minder_core::NetworkState;
use minder_sync::{NetworkProbe, TcpProbe};

use crate::error::Result;

use super::Context;

pub async fn run(ctx: &Context) -> Result<()> {
    let probe = TcpProbe::from_config(&ctx.config.network);
    let state = probe.probe().await;
    let queue = ctx.open_queue().await?;

    println!("network: {}", describe(&state));
    println!("pending: {}/{}", queue.len(), queue.capacity());
    println!("queue:   {}", ctx.db_path().display());
    Ok(())
}

/// One-word connectivity summary with link type when known.
pub fn describe(state: &NetworkState) -> String {
    if !state.is_connected {
        return "offline".to_string();
    }
    let mut out = format!("online ({})", state.connection_type.as_str());
    if state.is_metered {
        out.push_str(", metered");
    }
    out
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
