// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `minder status` and global flags.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::net::TcpListener;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn minder_with_hosts(temp: &TempDir, hosts: &[String]) -> Command {
    let config = temp.path().join("config.toml");
    let list: Vec<String> = hosts.iter().map(|h| format!("{h:?}")).collect();
    std::fs::write(
        &config,
        format!("[network]\nprobe_hosts = [{}]\nprobe_timeout_ms = 500\n", list.join(", ")),
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("minder");
    cmd.env("MINDER_CONFIG", &config)
        .env_remove("MINDER_STATE_DIR")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn status_offline_with_no_probe_hosts() {
    let temp = TempDir::new().unwrap();
    let state = temp.path().join("state");
    minder_with_hosts(&temp, &[])
        .arg("status")
        .arg("--state-dir")
        .arg(&state)
        .assert()
        .success()
        .stdout(predicate::str::contains("network: offline"))
        .stdout(predicate::str::contains("pending: 0/100"));
    assert!(state.join("queue.db").exists());
}

#[test]
fn status_online_when_probe_host_accepts() {
    let temp = TempDir::new().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let host = listener.local_addr().unwrap().to_string();

    minder_with_hosts(&temp, &[host])
        .args(["--state-dir"])
        .arg(temp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("network: online (unknown)"));
}

#[test]
fn state_dir_flag_separates_queues() {
    let temp = TempDir::new().unwrap();
    let (a, b) = (temp.path().join("a"), temp.path().join("b"));

    minder_with_hosts(&temp, &[])
        .args(["queue", "add", "POST", "/x", "--state-dir"])
        .arg(&a)
        .assert()
        .success();

    minder_with_hosts(&temp, &[])
        .args(["status", "--state-dir"])
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("pending: 0/100"));
    minder_with_hosts(&temp, &[])
        .args(["status", "--state-dir"])
        .arg(&a)
        .assert()
        .success()
        .stdout(predicate::str::contains("pending: 1/100"));
}

#[test]
fn verbose_logs_to_stderr() {
    let temp = TempDir::new().unwrap();
    minder_with_hosts(&temp, &[])
        .args(["-v", "queue", "add", "GET", "/v", "--state-dir"])
        .arg(temp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("queued from cli"));
}
