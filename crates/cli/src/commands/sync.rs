// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot replay of the persisted queue.
//!
//! Connectivity is not probed first: the command is an explicit request to
//! try now, and unreachable hosts surface as retryable failures.

use std::sync::Arc;

use minder_core::SyncStats;
use minder_sync::{
    CredentialSource, HttpTransport, StaticCredential, SyncDriver, SyncOutcome, Transport,
};
use tracing::info;

use crate::error::{Error, Result};

use super::Context;

pub async fn run(ctx: &Context, token: Option<String>) -> Result<()> {
    let transport = Arc::new(HttpTransport::new(ctx.config.transport.clone())?);

    // Ctrl-C aborts in-flight requests; they count as retryable failures
    // and the pass still persists its progress.
    let on_interrupt = transport.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling in-flight requests");
            on_interrupt.cancel_all();
        }
    });

    let result = replay(ctx, transport, token).await;
    interrupt.abort();

    let stats = result?;
    print_stats(&stats);
    if stats.failed > 0 {
        return Err(Error::SyncFailed { failed: stats.failed, total: stats.total });
    }
    Ok(())
}

/// Replay the queue once over `transport`.
pub async fn replay(
    ctx: &Context,
    transport: Arc<dyn Transport>,
    token: Option<String>,
) -> Result<SyncStats> {
    let queue = ctx.open_queue().await?;
    let mut driver =
        SyncDriver::new(queue, transport).with_config(&ctx.config.offline, &ctx.config.token);
    if let Some(token) = token {
        let credential: Arc<dyn CredentialSource> = Arc::new(StaticCredential(token));
        driver = driver.with_credentials(credential);
    }

    match driver.sync().await {
        SyncOutcome::Completed(stats) => Ok(stats),
        SyncOutcome::AlreadyRunning | SyncOutcome::Offline => Err(Error::SyncBusy),
    }
}

/// Human-readable summary lines for a pass.
pub fn summary(stats: &SyncStats) -> Vec<String> {
    if stats.total == 0 {
        return vec!["Nothing to sync.".to_string()];
    }

    let mut lines = vec![format!(
        "Synced {} of {} ({} failed, {} discarded, {} deferred) in {}ms",
        stats.successful,
        stats.total,
        stats.failed,
        stats.discarded,
        stats.deferred,
        stats.duration_ms,
    )];
    for failure in &stats.errors {
        lines.push(format!("  {}: {}", failure.request_id, failure.error));
    }
    lines.push(format!("{} pending", stats.pending));
    lines
}

fn print_stats(stats: &SyncStats) {
    for line in summary(stats) {
        println!("{}", line);
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
