// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Directory-backed storage: one file per key.
//!
//! Writes go to a temporary sibling and are renamed into place, so readers
//! never observe a partially written value. Writers in different processes
//! serialize on an exclusive lock over `.lock` in the same directory.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use super::{blocking, Storage, StorageError, StorageFuture, StorageResult};

const LOCK_FILE: &str = ".lock";

/// Key-value storage in a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` for storage. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn lock(&self) -> StorageResult<File> {
        std::fs::create_dir_all(&self.dir)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.dir.join(LOCK_FILE))?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let lock = self.lock()?;

        let tmp = path.with_extension("json.tmp");
        let mut file = File::create(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&tmp, &path)?;

        drop(lock);
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        if !self.dir.exists() {
            return Ok(());
        }
        let lock = self.lock()?;
        let result = match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        };
        drop(lock);
        result
    }
}

impl Storage for FileStorage {
    fn get_item<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        let this = self.clone();
        let key = key.to_string();
        Box::pin(blocking(move || this.read(&key)))
    }

    fn set_item<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()> {
        let this = self.clone();
        let key = key.to_string();
        Box::pin(blocking(move || this.write(&key, &value)))
    }

    fn remove_item<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        let this = self.clone();
        let key = key.to_string();
        Box::pin(blocking(move || this.delete(&key)))
    }
}
