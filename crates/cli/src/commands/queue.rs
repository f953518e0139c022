// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use minder_core::{HttpMethod, QueuedRequest, RequestOptions};
use tracing::debug;

use crate::cli::QueueCommand;
use crate::error::{Error, Result};

use super::Context;

/// Execute a queue subcommand.
pub async fn run(ctx: &Context, cmd: QueueCommand) -> Result<()> {
    match cmd {
        QueueCommand::List { json } => list(ctx, json).await,
        QueueCommand::Add {
            method,
            url,
            headers,
            body,
            priority,
            max_retries,
        } => {
            let options = build_options(&headers, body.as_deref(), priority, max_retries)?;
            let id = add(ctx, method, url, options).await?;
            println!("{}", id);
            Ok(())
        }
        QueueCommand::Remove { id } => {
            remove(ctx, &id).await?;
            println!("Removed {}", id);
            Ok(())
        }
        QueueCommand::Clear => {
            let cleared = clear(ctx).await?;
            println!("Cleared {} {}", cleared, plural(cleared));
            Ok(())
        }
    }
}

async fn list(ctx: &Context, json: bool) -> Result<()> {
    let queue = ctx.open_queue().await?;
    let requests = queue.get_queue();

    if json {
        println!("{}", serde_json::to_string_pretty(&requests)?);
        return Ok(());
    }
    if requests.is_empty() {
        println!("Queue is empty.");
        return Ok(());
    }
    for request in &requests {
        println!("{}", format_entry(request));
    }
    Ok(())
}

/// Queue a request and return its id.
pub async fn add(
    ctx: &Context,
    method: HttpMethod,
    url: String,
    options: RequestOptions,
) -> Result<String> {
    let queue = ctx.open_queue().await?;
    let id = queue.add_to_queue(method, url, options).await?;
    debug!(id = %id, pending = queue.len(), "queued from cli");
    Ok(id)
}

/// Remove a request by id.
pub async fn remove(ctx: &Context, id: &str) -> Result<()> {
    let queue = ctx.open_queue().await?;
    if queue.remove_from_queue(id).await {
        Ok(())
    } else {
        Err(Error::RequestNotFound(id.to_string()))
    }
}

/// Empty the queue and return how many requests were dropped.
pub async fn clear(ctx: &Context) -> Result<usize> {
    let queue = ctx.open_queue().await?;
    let count = queue.len();
    queue.clear_queue().await;
    Ok(count)
}

/// Assemble request options from command line values.
pub fn build_options(
    headers: &[String],
    body: Option<&str>,
    priority: i32,
    max_retries: Option<u32>,
) -> Result<RequestOptions> {
    let mut options = RequestOptions::new().priority(priority);
    for raw in headers {
        let (name, value) = parse_header(raw)?;
        options = options.header(name, value);
    }
    if let Some(body) = body {
        let value = serde_json::from_str(body).map_err(Error::InvalidBody)?;
        options = options.body(value);
    }
    if let Some(max_retries) = max_retries {
        options = options.max_retries(max_retries);
    }
    Ok(options)
}

/// Split `Name: value` into a trimmed pair.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| Error::InvalidHeader(raw.to_string()))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(Error::InvalidHeader(raw.to_string()));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// One line of `queue list` output.
pub fn format_entry(request: &QueuedRequest) -> String {
    let mut line = format!(
        "{}  {}  {:<6} {}  priority={} retries={}/{}",
        request.id,
        request.enqueued_at().format("%Y-%m-%d %H:%M:%S"),
        request.method.as_str(),
        request.url,
        request.priority,
        request.retry_count,
        request.max_retries,
    );
    if let Some(error) = &request.last_error {
        line.push_str(&format!("  last_error={:?}", error));
    }
    line
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "request"
    } else {
        "requests"
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
