// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapters for the collaborators of clone admission: the on-disk clone
//! probe, the durable job scheduler, and the git clone executor.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clone;
pub mod probe;
pub mod scheduler;

pub use clone::{CloneError, CloneExecutor, CloneProgressSink, GitCloneExecutor};
pub use probe::{CloneProbe, FsCloneProbe, ProbeError};
pub use scheduler::{JobScheduler, ScheduleError, Scheduled, StoreScheduler};

#[cfg(any(test, feature = "test-support"))]
pub use clone::{CloneCall, FakeCloneExecutor};
#[cfg(any(test, feature = "test-support"))]
pub use probe::FakeCloneProbe;
#[cfg(any(test, feature = "test-support"))]
pub use scheduler::FakeScheduler;
