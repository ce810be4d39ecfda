//! Waiting and running queues.
//!
//! The waiting queue is strict FIFO with stable zero-based indices assigned
//! at enqueue time. The running set is kept ordered by dispatch index so a
//! poll pass always visits jobs in ascending dispatch order.

use std::collections::VecDeque;

use crate::job::JobSpec;
use crate::transport::JobHandle;

/// Jobs enqueued but not yet dispatched, FIFO order.
#[derive(Debug, Default)]
pub struct WaitingQueue {
    jobs: VecDeque<(usize, JobSpec)>,
    enqueued: usize,
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job; returns its stable index (number of jobs enqueued
    /// before this call).
    pub fn enqueue(&mut self, job: JobSpec) -> usize {
        let index = self.enqueued;
        self.jobs.push_back((index, job));
        self.enqueued += 1;
        index
    }

    /// Remove and return the head of the queue, oldest first.
    pub fn pop_next(&mut self) -> Option<(usize, JobSpec)> {
        self.jobs.pop_front()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Total jobs ever enqueued; fixed once the run starts.
    pub fn enqueued(&self) -> usize {
        self.enqueued
    }
}

/// Jobs dispatched but not yet observed as finished, keyed by dispatch index.
///
/// Dispatch order follows enqueue order, so pushing on dispatch keeps the
/// backing vec sorted by index and iteration deterministic.
#[derive(Debug, Default)]
pub struct RunningSet {
    entries: Vec<(usize, JobHandle)>,
}

impl RunningSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: usize, handle: JobHandle) {
        debug_assert!(
            self.entries.last().map_or(true, |(last, _)| *last < index),
            "running set must stay ordered by dispatch index"
        );
        self.entries.push((index, handle));
    }

    /// Remove a finished job by its dispatch index, returning its handle.
    pub fn remove(&mut self, index: usize) -> Option<JobHandle> {
        let pos = self.entries.iter().position(|(i, _)| *i == index)?;
        Some(self.entries.remove(pos).1)
    }

    /// Iterate in ascending dispatch order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (usize, JobHandle)> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Close every remaining handle and empty the set; returns how many
    /// were still open. Used on the timeout path so no connection outlives
    /// the run.
    pub fn close_all(&mut self) -> usize {
        let mut closed = 0;
        for (_, handle) in &mut self.entries {
            if !handle.is_closed() {
                handle.close();
                closed += 1;
            }
        }
        self.entries.clear();
        closed
    }
}
