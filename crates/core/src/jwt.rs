// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only view over JWT-shaped bearer tokens.
//!
//! Only the payload segment is decoded, to learn the advertised expiration
//! for scheduling. Signatures are not verified. Malformed tokens decode to
//! `None` and every derived predicate reports "unknown" instead of failing:
//! not expired, not needing refresh.

use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

/// Default lead time before expiry at which a refresh is due.
pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// Decoded payload claims of a token.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims {
    payload: Map<String, Value>,
}

impl Claims {
    /// The `exp` claim in seconds since the epoch, if numeric.
    pub fn exp(&self) -> Option<f64> {
        self.payload.get("exp").and_then(Value::as_f64).filter(|exp| exp.is_finite())
    }

    /// The `iat` claim in seconds since the epoch, if numeric.
    pub fn issued_at(&self) -> Option<f64> {
        self.payload.get("iat").and_then(Value::as_f64)
    }

    /// The `sub` claim.
    pub fn subject(&self) -> Option<&str> {
        self.payload.get("sub").and_then(Value::as_str)
    }

    /// Expiration instant in milliseconds since the epoch.
    ///
    /// Negative values and instants past `i64::MAX` milliseconds are unknown.
    pub fn expires_at_ms(&self) -> Option<u64> {
        let ms = self.exp()? * 1000.0;
        if !(0.0..MAX_EXPIRY_MS).contains(&ms) {
            return None;
        }
        Some(ms as u64)
    }

    /// Looks up an arbitrary claim.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

/// `2^63`, the first millisecond count that does not fit an `i64`.
const MAX_EXPIRY_MS: f64 = 9_223_372_036_854_775_808.0;

/// Decodes the payload segment of a `header.payload.signature` token.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let mut segments = token.trim().split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(payload) => Some(Claims { payload }),
        _ => None,
    }
}

/// Expiration instant of `token` in milliseconds since the epoch.
pub fn expiration_ms(token: &str) -> Option<u64> {
    decode_claims(token)?.expires_at_ms()
}

/// Milliseconds left until `token` expires; negative once expired.
pub fn time_until_expiration_ms(token: &str, now_ms: u64) -> Option<i64> {
    let exp = i64::try_from(expiration_ms(token)?).ok()?;
    exp.checked_sub(i64::try_from(now_ms).ok()?)
}

/// Returns true if `token` advertises an expiration at or before `now_ms`.
pub fn is_expired(token: &str, now_ms: u64) -> bool {
    time_until_expiration_ms(token, now_ms).is_some_and(|remaining| remaining <= 0)
}

/// Returns true if no more than `threshold` remains before `token` expires.
pub fn needs_refresh(token: &str, now_ms: u64, threshold: Duration) -> bool {
    let threshold = i64::try_from(threshold.as_millis()).unwrap_or(i64::MAX);
    time_until_expiration_ms(token, now_ms).is_some_and(|remaining| remaining <= threshold)
}

#[cfg(test)]
#[path = "jwt_tests.rs"]
mod tests;
