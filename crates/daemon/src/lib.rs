// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Garage Keeper daemon (gkd) internals
//!
//! The binary wires these together; they are exposed as a library so
//! integration tests can drive the daemon pieces directly.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod backend;
pub mod config;
pub mod controller;
pub mod lifecycle;
pub mod protocol;
pub mod server;
