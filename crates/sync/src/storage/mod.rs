// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value storage abstraction for queue persistence.
//!
//! The queue engine treats storage as an opaque, possibly absent dependency.
//! Any store that can get, set and remove string values by key can back it:
//! - [`MemoryStorage`] for tests and hosts without durable storage
//! - [`FileStorage`] for one JSON file per key in a directory
//! - [`SqliteStorage`] for a single SQLite database

mod file;
mod memory;
mod sqlite;

use std::future::Future;
use std::pin::Pin;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Key cannot be mapped onto the backend.
    #[error("invalid storage key: '{0}'")]
    InvalidKey(String),

    /// Backend is not reachable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future returned by [`Storage`] methods.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = StorageResult<T>> + Send + 'a>>;

/// Asynchronous key-value store.
///
/// Implementations must be safe to share between tasks; the queue engine
/// serializes its own writes but reads may overlap with them.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    fn get_item<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove_item<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;
}

/// Runs blocking backend work off the async executor.
async fn blocking<T, F>(f: F) -> StorageResult<T>
where
    F: FnOnce() -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Unavailable(format!("storage task failed: {e}")))?
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
