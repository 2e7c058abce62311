// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clone admission engine: the in-flight clone registry, the admission
//! controller that answers repository requests, and the worker that runs
//! scheduled clones.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod admission;
pub mod locker;
pub mod worker;

pub use admission::{
    AdmissionController, AutoClonePolicy, AutoCloneSwitch, ParsePolicyError, ProbeFailurePolicy,
};
pub use locker::{CloneLock, InFlightClone, RepositoryLocker};
pub use worker::{CloneWorker, JobOutcome, WorkerError, DEFAULT_POLL_INTERVAL};
