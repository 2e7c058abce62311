// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry of in-flight clones and their progress text.
//!
//! One mutex guards the whole map, so checking for a record and inserting one
//! happen in a single critical section. The lock is never held across I/O.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cg_adapters::CloneProgressSink;
use cg_core::CloneDir;
use parking_lot::Mutex;

#[derive(Debug, Clone)]
struct CloneProgressRecord {
    progress: String,
    started_at: Instant,
}

/// A clone currently holding its directory slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlightClone {
    pub dir: CloneDir,
    pub progress: String,
    pub elapsed: Duration,
}

/// Shared handle to the in-flight clone registry.
///
/// At most one record exists per [`CloneDir`]. Whoever wins [`begin`] owns
/// the slot and must release it with [`end`], on failure too;
/// [`try_lock`] does that automatically.
///
/// [`begin`]: RepositoryLocker::begin
/// [`end`]: RepositoryLocker::end
/// [`try_lock`]: RepositoryLocker::try_lock
#[derive(Clone, Default)]
pub struct RepositoryLocker {
    inner: Arc<Mutex<HashMap<CloneDir, CloneProgressRecord>>>,
}

impl RepositoryLocker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress text of the clone in flight for `dir`, if any.
    pub fn status(&self, dir: &CloneDir) -> Option<String> {
        self.inner.lock().get(dir).map(|r| r.progress.clone())
    }

    /// Claim the slot for `dir`. Returns `true` if a clone already holds it,
    /// in which case nothing changes.
    pub fn begin(&self, dir: &CloneDir) -> bool {
        match self.inner.lock().entry(dir.clone()) {
            Entry::Occupied(_) => true,
            Entry::Vacant(slot) => {
                slot.insert(CloneProgressRecord {
                    progress: String::new(),
                    started_at: Instant::now(),
                });
                false
            }
        }
    }

    /// Replace the progress text of an existing record. Never creates one.
    pub fn update_progress(&self, dir: &CloneDir, text: &str) -> bool {
        match self.inner.lock().get_mut(dir) {
            Some(record) => {
                text.clone_into(&mut record.progress);
                true
            }
            None => false,
        }
    }

    /// Release the slot for `dir`. Returns whether a record was removed.
    pub fn end(&self, dir: &CloneDir) -> bool {
        self.inner.lock().remove(dir).is_some()
    }

    /// Claim the slot as a guard that releases it on drop.
    pub fn try_lock(&self, dir: &CloneDir) -> Option<CloneLock> {
        if self.begin(dir) {
            None
        } else {
            Some(CloneLock {
                locker: self.clone(),
                dir: dir.clone(),
            })
        }
    }

    /// Snapshot of every in-flight clone, ordered by directory
    pub fn in_progress(&self) -> Vec<InFlightClone> {
        let mut clones: Vec<_> = self
            .inner
            .lock()
            .iter()
            .map(|(dir, record)| InFlightClone {
                dir: dir.clone(),
                progress: record.progress.clone(),
                elapsed: record.started_at.elapsed(),
            })
            .collect();
        clones.sort_by(|a, b| a.dir.cmp(&b.dir));
        clones
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// Ownership of one clone slot; the slot is released when this drops.
pub struct CloneLock {
    locker: RepositoryLocker,
    dir: CloneDir,
}

impl CloneLock {
    pub fn dir(&self) -> &CloneDir {
        &self.dir
    }

    pub fn set_progress(&self, text: &str) {
        self.locker.update_progress(&self.dir, text);
    }
}

impl CloneProgressSink for CloneLock {
    fn update(&self, text: &str) {
        self.set_progress(text);
    }
}

impl Drop for CloneLock {
    fn drop(&mut self) {
        self.locker.end(&self.dir);
    }
}

impl std::fmt::Debug for CloneLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloneLock").field("dir", &self.dir).finish()
    }
}

#[cfg(test)]
#[path = "locker_tests.rs"]
mod tests;
