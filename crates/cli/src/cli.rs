// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parse an HTTP method name, case-insensitively.
fn http_method(s: &str) -> Result<minder_core::HttpMethod, String> {
    s.parse().map_err(|e: minder_core::Error| e.to_string())
}

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

#[derive(Parser, Debug)]
#[command(name = "minder")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and replay the offline request queue")]
#[command(
    long_about = "Inspect and replay the offline request queue.\n\n\
    Requests queued while offline are stored in the state directory and \
    replayed in priority order by 'minder sync'."
)]
pub struct Cli {
    /// Read configuration from this file
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Keep the queue database in this directory
    #[arg(long = "state-dir", global = true, value_name = "path")]
    pub state_dir: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage queued requests
    #[command(subcommand)]
    Queue(QueueCommand),

    /// Replay the queue against the server
    #[command(after_help = "\
Examples:
  minder sync                       Replay with no credentials
  minder sync --token eyJhbGciOi... Replay with a bearer token")]
    Sync {
        /// Bearer token attached to every replayed request
        #[arg(long, value_name = "token")]
        token: Option<String>,
    },

    /// Inspect access tokens
    #[command(subcommand)]
    Token(TokenCommand),

    /// Show connectivity and pending request count
    Status,
}

#[derive(Subcommand, Debug)]
pub enum QueueCommand {
    /// List queued requests in replay order
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Queue a request for the next sync
    #[command(
        arg_required_else_help = true,
        after_help = "\
Examples:
  minder queue add POST /notes --body '{\"text\":\"hi\"}'
  minder queue add PUT /items/7 -H 'If-Match: 3' --priority 5
  minder queue add DELETE /items/7 --max-retries 1"
    )]
    Add {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        #[arg(value_parser = http_method)]
        method: minder_core::HttpMethod,

        /// Absolute URL or path relative to transport.base_url
        #[arg(value_parser = non_empty_string)]
        url: String,

        /// Header as 'Name: value' (repeatable)
        #[arg(short = 'H', long = "header", value_name = "header")]
        headers: Vec<String>,

        /// JSON request body
        #[arg(long, value_name = "json")]
        body: Option<String>,

        /// Higher values replay first
        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        priority: i32,

        /// Attempts before the request is dropped
        #[arg(long, value_name = "n")]
        max_retries: Option<u32>,
    },

    /// Remove a queued request by id
    #[command(arg_required_else_help = true)]
    Remove {
        /// Request id as shown by 'minder queue list'
        id: String,
    },

    /// Remove every queued request
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Decode a JWT and report its expiry and refresh timing
    #[command(arg_required_else_help = true)]
    Inspect {
        /// The token to inspect
        token: String,

        /// Refresh threshold in seconds (default: token.refresh_threshold_secs)
        #[arg(long, value_name = "secs")]
        threshold: Option<u64>,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
