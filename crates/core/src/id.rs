// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use sha2::{Digest, Sha256};

use crate::request::HttpMethod;

/// Prefix of every generated request ID.
pub const REQUEST_ID_PREFIX: &str = "req";

/// Generate a request ID from method, URL, enqueue time and a sequence number.
/// Format: req-{hash} where hash is first 12 hex chars of SHA256 over the inputs.
pub fn generate_id(method: HttpMethod, url: &str, timestamp_ms: u64, seq: u64) -> String {
    let input = format!("{}\n{}\n{}\n{}", method, url, timestamp_ms, seq);
    let hash = Sha256::digest(input.as_bytes());
    let short_hash = hex::encode(&hash[..6]);
    format!("{}-{}", REQUEST_ID_PREFIX, short_hash)
}

/// Generate a unique ID, handling collisions by appending incrementing suffix.
pub fn generate_unique_id<F>(
    method: HttpMethod,
    url: &str,
    timestamp_ms: u64,
    seq: u64,
    exists: F,
) -> String
where
    F: Fn(&str) -> bool,
{
    let base_id = generate_id(method, url, timestamp_ms, seq);

    if !exists(&base_id) {
        return base_id;
    }

    let mut suffix = 2;
    loop {
        let id = format!("{}-{}", base_id, suffix);
        if !exists(&id) {
            return id;
        }
        suffix += 1;
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
