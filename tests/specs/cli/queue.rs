// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `minder queue` and `minder sync`.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `minder` confined to a temp state dir and an empty config file.
fn minder(temp: &TempDir) -> Command {
    let config = temp.path().join("config.toml");
    if !config.exists() {
        std::fs::write(&config, "[network]\nprobe_hosts = []\n").unwrap();
    }
    let mut cmd = cargo_bin_cmd!("minder");
    cmd.env("MINDER_STATE_DIR", temp.path().join("state"))
        .env("MINDER_CONFIG", &config)
        .env_remove("RUST_LOG");
    cmd
}

fn add(temp: &TempDir, args: &[&str]) -> String {
    let output = minder(temp).arg("queue").arg("add").args(args).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

fn list_json(temp: &TempDir) -> Vec<serde_json::Value> {
    let output = minder(temp).args(["queue", "list", "--json"]).output().unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Answer `count` HTTP requests with `status`, returning the request lines seen.
fn serve(status: u16, count: usize) -> (String, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0..count {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = stream.read(&mut chunk).unwrap();
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .filter_map(|l| l.split_once(':'))
                        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= end + 4 + length || n == 0 {
                        seen.push(text.lines().next().unwrap_or_default().to_string());
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status} X\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
            );
            stream.write_all(response.as_bytes()).unwrap();
        }
        seen
    });
    (base, handle)
}

#[test]
fn list_empty_queue() {
    let temp = TempDir::new().unwrap();
    minder(&temp)
        .args(["queue", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Queue is empty."));
}

#[test]
fn add_prints_id_and_lists_in_priority_order() {
    let temp = TempDir::new().unwrap();
    let low = add(&temp, &["POST", "/notes", "--priority", "1"]);
    let high = add(&temp, &["PUT", "/items/1", "--priority", "5", "-H", "If-Match: 3"]);
    let mid = add(&temp, &["delete", "/items/2", "--priority", "3"]);
    assert!(low.starts_with("req-"), "{low}");

    let ids: Vec<String> = list_json(&temp)
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![high.clone(), mid, low]);

    minder(&temp)
        .args(["queue", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{high}  ")))
        .stdout(predicate::str::contains("PUT    /items/1  priority=5 retries=0/3"));
}

#[test]
fn add_with_body_and_max_retries() {
    let temp = TempDir::new().unwrap();
    add(&temp, &["PATCH", "/items/1", "--body", r#"{"done":true}"#, "--max-retries", "1"]);

    let queued = list_json(&temp);
    assert_eq!(queued[0]["body"], serde_json::json!({"done": true}));
    assert_eq!(queued[0]["maxRetries"], 1);
    assert_eq!(queued[0]["method"], "PATCH");
}

#[test]
fn add_rejects_bad_input() {
    let temp = TempDir::new().unwrap();
    minder(&temp)
        .args(["queue", "add", "FETCH", "/a"])
        .assert()
        .failure();
    minder(&temp)
        .args(["queue", "add", "POST", "/a", "--body", "{"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid body"));
    minder(&temp)
        .args(["queue", "add", "POST", "/a", "-H", "nocolon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid header"));
}

#[test]
fn remove_and_clear() {
    let temp = TempDir::new().unwrap();
    let first = add(&temp, &["POST", "/a"]);
    add(&temp, &["POST", "/b"]);
    add(&temp, &["POST", "/c"]);

    minder(&temp)
        .args(["queue", "remove", &first])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Removed {first}")));
    minder(&temp)
        .args(["queue", "remove", &first])
        .assert()
        .failure()
        .stderr(predicate::str::contains("request not found"));

    minder(&temp)
        .args(["queue", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 2 requests"));
    assert!(list_json(&temp).is_empty());
}

#[test]
fn sync_empty_queue() {
    let temp = TempDir::new().unwrap();
    minder(&temp)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to sync."));
}

#[test]
fn sync_delivers_queued_requests() {
    let temp = TempDir::new().unwrap();
    let (base, server) = serve(200, 2);
    add(&temp, &["POST", &format!("{base}/low")]);
    add(&temp, &["PUT", &format!("{base}/high"), "--priority", "9"]);

    minder(&temp)
        .args(["sync", "--token", "abc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Synced 2 of 2"))
        .stdout(predicate::str::contains("0 pending"));

    let mut seen = server.join().unwrap();
    seen.sort();
    assert_eq!(seen, vec!["POST /low HTTP/1.1", "PUT /high HTTP/1.1"]);
    assert!(list_json(&temp).is_empty());
}

#[test]
fn sync_keeps_requests_the_server_rejects_transiently() {
    let temp = TempDir::new().unwrap();
    let (base, server) = serve(503, 1);
    add(&temp, &["POST", &format!("{base}/busy")]);

    minder(&temp)
        .arg("sync")
        .assert()
        .failure()
        .stdout(predicate::str::contains("1 pending"))
        .stderr(predicate::str::contains("1 of 1 requests failed"));
    server.join().unwrap();

    let queued = list_json(&temp);
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0]["retryCount"], 1);
}
