// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! minder_cli - command line front end for the minder offline queue.
//!
//! The binary opens the queue persisted under the state directory, lets you
//! inspect and edit it, and replays it over HTTP on demand.

mod cli;
mod commands;
pub mod config;
pub mod env;
pub mod error;
mod logging;

pub use cli::{Cli, Command, QueueCommand, TokenCommand};
pub use error::{Error, Result};

use commands::Context;

/// Execute a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose);

    let config = config::load(cli.config.as_deref())?;
    let state_dir = config::state_dir(cli.state_dir.as_deref());
    let ctx = Context::new(config, state_dir);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match cli.command {
            Command::Queue(cmd) => commands::queue::run(&ctx, cmd).await,
            Command::Sync { token } => commands::sync::run(&ctx, token).await,
            Command::Token(cmd) => commands::token::run(&ctx, cmd),
            Command::Status => commands::status::run(&ctx).await,
        }
    })
}
