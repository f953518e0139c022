// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod queue;
pub mod status;
pub mod sync;
pub mod token;

use std::path::PathBuf;
use std::sync::Arc;

use minder_core::{system_clock, Config};
use minder_sync::{OfflineQueue, SqliteStorage, Storage};

use crate::config::QUEUE_DB_NAME;
use crate::error::Result;

/// Resolved settings shared by every command.
pub struct Context {
    pub config: Config,
    pub state_dir: PathBuf,
}

impl Context {
    pub fn new(config: Config, state_dir: PathBuf) -> Self {
        Context { config, state_dir }
    }

    pub fn db_path(&self) -> PathBuf {
        self.state_dir.join(QUEUE_DB_NAME)
    }

    /// Open the queue database, creating the state directory if needed.
    pub fn open_storage(&self) -> Result<Arc<dyn Storage>> {
        Ok(Arc::new(SqliteStorage::open(&self.db_path())?))
    }

    /// Open the persisted queue and load its contents.
    pub async fn open_queue(&self) -> Result<Arc<OfflineQueue>> {
        let storage = self.open_storage()?;
        let queue = OfflineQueue::new(&self.config.offline, Some(storage), system_clock());
        queue.restore().await;
        Ok(Arc::new(queue))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
