// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box specs for the `minder` binary.
//!
//! The files under `cli/` are compiled as integration tests of the
//! `minder` package so they can locate its binary.
