// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use chrono::{DateTime, Utc};
use minder_core::{jwt, ClockSource, SystemClock};

use crate::cli::TokenCommand;
use crate::error::{Error, Result};

use super::Context;

/// What `token inspect` reports about a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenReport {
    pub subject: Option<String>,
    pub expires_at: DateTime<Utc>,
    /// Milliseconds left; negative once expired.
    pub remaining_ms: i64,
    pub threshold: Duration,
}

impl TokenReport {
    pub fn is_expired(&self) -> bool {
        self.remaining_ms <= 0
    }

    pub fn needs_refresh(&self) -> bool {
        self.remaining_ms <= self.threshold.as_millis() as i64
    }

    /// When a scheduler would fire the refresh.
    pub fn refresh_at(&self) -> DateTime<Utc> {
        let lead = chrono::Duration::milliseconds(self.threshold.as_millis() as i64);
        self.expires_at - lead
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(subject) = &self.subject {
            lines.push(format!("subject:       {}", subject));
        }
        lines.push(format!("expires:       {}", self.expires_at.to_rfc3339()));
        if self.is_expired() {
            lines.push(format!("remaining:     expired {} ago", human(-self.remaining_ms)));
        } else {
            lines.push(format!("remaining:     {}", human(self.remaining_ms)));
        }
        lines.push(format!("refresh at:    {}", self.refresh_at().to_rfc3339()));
        lines.push(format!(
            "needs refresh: {}",
            if self.needs_refresh() { "yes" } else { "no" }
        ));
        lines
    }
}

pub fn run(ctx: &Context, cmd: TokenCommand) -> Result<()> {
    match cmd {
        TokenCommand::Inspect { token, threshold } => {
            let threshold = threshold
                .map(Duration::from_secs)
                .unwrap_or_else(|| ctx.config.token.refresh_threshold());
            let report = inspect(&token, SystemClock.now_ms(), threshold)?;
            for line in report.lines() {
                println!("{}", line);
            }
            Ok(())
        }
    }
}

/// Decode `token` and measure it against `now_ms`.
pub fn inspect(token: &str, now_ms: u64, threshold: Duration) -> Result<TokenReport> {
    let claims = jwt::decode_claims(token).ok_or(Error::UnreadableToken)?;
    let expires_ms = claims
        .expires_at_ms()
        .and_then(|ms| i64::try_from(ms).ok())
        .ok_or(Error::UnreadableToken)?;
    let expires_at =
        DateTime::<Utc>::from_timestamp_millis(expires_ms).ok_or(Error::UnreadableToken)?;
    let now_ms = i64::try_from(now_ms).unwrap_or(i64::MAX);

    Ok(TokenReport {
        subject: claims.subject().map(str::to_string),
        expires_at,
        remaining_ms: expires_ms.saturating_sub(now_ms),
        threshold,
    })
}

/// Render milliseconds as `1h 2m 3s`, dropping leading zero units.
pub fn human(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{}s", s),
        (0, _) => format!("{}m {}s", m, s),
        _ => format!("{}h {}m {}s", h, m, s),
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
