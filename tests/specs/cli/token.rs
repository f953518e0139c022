// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Specs for `minder token inspect`.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::time::{SystemTime, UNIX_EPOCH};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use predicates::prelude::*;
use tempfile::TempDir;
use yare::parameterized;

fn minder(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("minder");
    cmd.env("MINDER_STATE_DIR", temp.path())
        .env("MINDER_CONFIG", temp.path().join("absent-ok.toml"))
        .env_remove("RUST_LOG");
    cmd
}

/// Token expiring `secs` from now.
fn token_expiring_in(secs: i64) -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64;
    let claims = serde_json::json!({"sub": "user-7", "exp": now + secs});
    format!(
        "{}.{}.sig",
        URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

fn write_config(temp: &TempDir, body: &str) {
    std::fs::write(temp.path().join("absent-ok.toml"), body).unwrap();
}

#[parameterized(
    fresh = { 3600, "needs refresh: no" },
    inside_default_threshold = { 120, "needs refresh: yes" },
)]
fn inspect_reports_refresh_need(secs: i64, expected: &str) {
    let temp = TempDir::new().unwrap();
    write_config(&temp, "");
    minder(&temp)
        .args(["token", "inspect", &token_expiring_in(secs)])
        .assert()
        .success()
        .stdout(predicate::str::contains("subject:       user-7"))
        .stdout(predicate::str::contains(expected));
}

#[test]
fn inspect_threshold_flag_overrides_config() {
    let temp = TempDir::new().unwrap();
    write_config(&temp, "[token]\nrefresh_threshold_secs = 10\n");
    let token = token_expiring_in(120);

    minder(&temp)
        .args(["token", "inspect", &token])
        .assert()
        .success()
        .stdout(predicate::str::contains("needs refresh: no"));
    minder(&temp)
        .args(["token", "inspect", &token, "--threshold", "600"])
        .assert()
        .success()
        .stdout(predicate::str::contains("needs refresh: yes"));
}

#[test]
fn inspect_expired_token() {
    let temp = TempDir::new().unwrap();
    write_config(&temp, "");
    minder(&temp)
        .args(["token", "inspect", &token_expiring_in(-600)])
        .assert()
        .success()
        .stdout(predicate::str::contains("expired"))
        .stdout(predicate::str::contains("ago"));
}

#[test]
fn inspect_opaque_token_fails() {
    let temp = TempDir::new().unwrap();
    write_config(&temp, "");
    minder(&temp)
        .args(["token", "inspect", "opaque"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: token has no readable 'exp' claim"));
}

#[test]
fn explicit_config_must_exist() {
    let temp = TempDir::new().unwrap();
    minder(&temp)
        .args(["token", "inspect", "x.y.z"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}
