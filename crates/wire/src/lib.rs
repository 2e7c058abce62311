// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC Protocol between the clonegate daemon and its clients.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod lookup;
mod request;
mod response;
mod wire;

pub use lookup::RepoLookup;
pub use request::Request;
pub use response::{CloneEntry, Response};
pub use wire::{decode, encode, read_message, write_message, ProtocolError, MAX_MESSAGE_LEN};
pub use wire::{read_request, read_response, write_request, write_response};

/// Protocol version exchanged in the Hello handshake
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");
