// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable clone job store.
//!
//! Jobs are persisted as an append-only JSON-lines log and rebuilt by replay
//! on open.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod state;
mod store;

pub use state::{JobState, StoreEvent};
pub use store::{JobStore, StoreError, StoreRecord};
