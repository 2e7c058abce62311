// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cg-core: Core types for the clonegate on-demand clone service

pub mod macros;

pub mod clock;
pub mod decision;
pub mod job;
pub mod repo;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use decision::{AdmissionDecision, RejectReason};
pub use job::{CloneJob, CloneJobId, CloneJobStatus, CloneOptions, SchedulingRequest};
pub use repo::{CloneDir, RepoName, RepoNameError};
