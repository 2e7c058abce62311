// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only job log with idempotent job creation.
//!
//! Every mutation is written and synced before it becomes visible in memory.
//! On open the log is replayed, interrupted jobs are requeued, and the file is
//! rewritten to hold only live jobs.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use cg_core::{Clock, CloneJob, CloneJobId, CloneJobStatus, SchedulingRequest, SystemClock};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::state::{JobState, StoreEvent};

/// Appends after which the log is compacted in place
const COMPACT_AFTER: usize = 10_000;

/// Errors from job store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown clone job: {0}")]
    UnknownJob(CloneJobId),
}

/// One line of the job log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRecord {
    pub seq: u64,
    pub event: StoreEvent,
}

struct Inner {
    path: PathBuf,
    file: File,
    /// Length of the log up to the last fully synced record
    len: u64,
    /// A failed append could not be truncated away yet
    torn: bool,
    state: JobState,
    seq: u64,
    appended: usize,
    /// Cut the next append short after this many bytes and fail it
    #[cfg(test)]
    short_write: Option<usize>,
}

/// Durable store of clone jobs.
///
/// At most one queued or running job exists per repository; creating a job
/// for a repository that already has one returns the existing job.
pub struct JobStore<C: Clock = SystemClock> {
    inner: Mutex<Inner>,
    clock: C,
}

impl JobStore<SystemClock> {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::open_with_clock(path, SystemClock)
    }
}

impl<C: Clock> JobStore<C> {
    pub fn open_with_clock(path: &Path, clock: C) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut state = JobState::default();
        let mut seq = 0;
        if path.exists() {
            for record in read_records(path)? {
                seq = seq.max(record.seq);
                state.apply(&record.event);
            }
        }

        let interrupted: Vec<CloneJobId> = state
            .jobs()
            .iter()
            .filter(|j| j.status == CloneJobStatus::Running)
            .map(|j| j.id.clone())
            .collect();
        for id in &interrupted {
            state.apply(&StoreEvent::Requeued { id: id.clone() });
        }
        if !interrupted.is_empty() {
            info!(count = interrupted.len(), "requeued interrupted clone jobs");
        }

        let file = rewrite(path, &state, &mut seq)?;
        let len = file.metadata()?.len();
        info!(
            path = %path.display(),
            queued = state.count(CloneJobStatus::Queued),
            "opened clone job store"
        );

        Ok(Self {
            inner: Mutex::new(Inner {
                path: path.to_path_buf(),
                file,
                len,
                torn: false,
                state,
                seq,
                appended: 0,
                #[cfg(test)]
                short_write: None,
            }),
            clock,
        })
    }

    /// Record a clone request.
    ///
    /// Returns the job and whether it was newly created. An overwrite request
    /// upgrades a matching queued job rather than adding a second one.
    pub fn create(&self, req: SchedulingRequest) -> Result<(CloneJob, bool), StoreError> {
        let mut inner = self.inner.lock();

        if let Some(existing) = inner.state.live_for(&req.repo).cloned() {
            if req.overwrite && !existing.overwrite && existing.status == CloneJobStatus::Queued {
                inner.commit(StoreEvent::OverwriteRequested {
                    id: existing.id.clone(),
                })?;
            }
            let job = inner.state.get(&existing.id).cloned().unwrap_or(existing);
            return Ok((job, false));
        }

        let job = CloneJob::new(CloneJobId::new(), req, self.clock.epoch_ms());
        inner.commit(StoreEvent::Created { job: job.clone() })?;
        Ok((job, true))
    }

    /// Claim the oldest queued job, marking it running.
    pub fn take_next(&self) -> Result<Option<CloneJob>, StoreError> {
        let mut inner = self.inner.lock();
        let Some(id) = inner.state.next_queued().map(|j| j.id.clone()) else {
            return Ok(None);
        };
        inner.commit(StoreEvent::Started { id: id.clone() })?;
        Ok(inner.state.get(&id).cloned())
    }

    pub fn complete(&self, id: &CloneJobId) -> Result<(), StoreError> {
        self.finish(StoreEvent::Completed { id: id.clone() }, id)
    }

    pub fn fail(&self, id: &CloneJobId, error: impl Into<String>) -> Result<(), StoreError> {
        let event = StoreEvent::Failed {
            id: id.clone(),
            error: error.into(),
        };
        self.finish(event, id)
    }

    pub fn skip(&self, id: &CloneJobId, reason: impl Into<String>) -> Result<(), StoreError> {
        let event = StoreEvent::Skipped {
            id: id.clone(),
            reason: reason.into(),
        };
        self.finish(event, id)
    }

    fn finish(&self, event: StoreEvent, id: &CloneJobId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.get(id).is_none() {
            return Err(StoreError::UnknownJob(id.clone()));
        }
        inner.commit(event)
    }

    pub fn get(&self, id: &CloneJobId) -> Option<CloneJob> {
        self.inner.lock().state.get(id).cloned()
    }

    pub fn jobs(&self) -> Vec<CloneJob> {
        self.inner.lock().state.jobs().to_vec()
    }

    pub fn queued_count(&self) -> usize {
        self.inner.lock().state.count(CloneJobStatus::Queued)
    }

    pub fn running_count(&self) -> usize {
        self.inner.lock().state.count(CloneJobStatus::Running)
    }

    /// Queued and running job counts, read under one lock
    pub fn depth(&self) -> (usize, usize) {
        let inner = self.inner.lock();
        (
            inner.state.count(CloneJobStatus::Queued),
            inner.state.count(CloneJobStatus::Running),
        )
    }
}

impl Inner {
    /// Append and sync one event, then apply it.
    ///
    /// A failed append is truncated away so the log never holds a partial
    /// line that the next record would be glued onto.
    fn commit(&mut self, event: StoreEvent) -> Result<(), StoreError> {
        if self.torn {
            self.file.set_len(self.len)?;
            self.torn = false;
        }

        let record = StoreRecord {
            seq: self.seq + 1,
            event,
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');
        if let Err(e) = self.append(&line) {
            self.roll_back();
            return Err(e.into());
        }

        self.len += line.len() as u64;
        self.seq = record.seq;
        self.state.apply(&record.event);
        self.appended += 1;

        if self.appended >= COMPACT_AFTER {
            self.file = rewrite(&self.path, &self.state, &mut self.seq)?;
            self.len = self.file.metadata()?.len();
            self.appended = 0;
        }
        Ok(())
    }

    fn append(&mut self, line: &[u8]) -> io::Result<()> {
        self.inject_short_write(line)?;
        self.file.write_all(line)?;
        self.file.sync_data()
    }

    #[cfg(test)]
    fn inject_short_write(&mut self, line: &[u8]) -> io::Result<()> {
        match self.short_write.take() {
            Some(limit) => {
                self.file.write_all(&line[..limit.min(line.len())])?;
                Err(io::Error::new(io::ErrorKind::WriteZero, "short write"))
            }
            None => Ok(()),
        }
    }

    #[cfg(not(test))]
    fn inject_short_write(&mut self, _line: &[u8]) -> io::Result<()> {
        Ok(())
    }

    fn roll_back(&mut self) {
        if let Err(e) = self.file.set_len(self.len) {
            warn!(error = %e, "failed to truncate partial job store record");
            self.torn = true;
        }
    }
}

/// Read every parseable record; unreadable lines (e.g. a torn final write) are skipped.
fn read_records(path: &Path) -> Result<Vec<StoreRecord>, StoreError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<StoreRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => warn!(line = idx + 1, error = %e, "skipping unreadable job store record"),
        }
    }
    Ok(records)
}

/// Replace the log with one holding only live jobs and reopen it for appends.
fn rewrite(path: &Path, state: &JobState, seq: &mut u64) -> Result<File, StoreError> {
    let tmp = path.with_extension("tmp");
    {
        let mut out = File::create(&tmp)?;
        for event in state.compacted_events() {
            *seq += 1;
            let mut line = serde_json::to_vec(&StoreRecord { seq: *seq, event })?;
            line.push(b'\n');
            out.write_all(&line)?;
        }
        out.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(OpenOptions::new().append(true).open(path)?)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
