//! The orchestrator: slot budget, dispatch/poll loop, timeout policy, counters.
//!
//! Single control thread, no locks. Many connections are open at once
//! (bounded by the slot budget), each progressing independently at the
//! transport layer, but every inspection of their state happens serially
//! inside one poll pass per tick.

mod fill;
mod run;

use std::time::Duration;

use crate::config::QueueConfig;
use crate::job::JobSpec;
use crate::load::{LoadProbe, SystemLoad};
use crate::queue::{RunningSet, WaitingQueue};
use crate::runlog::RunLog;
use crate::transport::HttpDispatcher;

/// Default sleep between poll passes (the engine's "one time unit").
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Drives a batch of jobs from enqueue to completion. One instance runs one
/// batch; build a fresh scheduler for the next run.
pub struct Scheduler {
    cfg: QueueConfig,
    probe: Box<dyn LoadProbe>,
    dispatcher: HttpDispatcher,
    waiting: WaitingQueue,
    running: RunningSet,
    slots: usize,
    finished: usize,
    tick: Duration,
    log: RunLog,
}

impl Scheduler {
    /// Build a scheduler sampling the platform load average.
    pub fn new(cfg: QueueConfig) -> Self {
        Self::with_probe(cfg, Box::new(SystemLoad))
    }

    /// Build with a custom load probe (tests, or overriding the platform
    /// sample with a fixed figure).
    pub fn with_probe(cfg: QueueConfig, probe: Box<dyn LoadProbe>) -> Self {
        let dispatcher = HttpDispatcher::new(cfg.server_host.clone(), cfg.server_port);
        let log = RunLog::new(cfg.log_target);
        Self {
            cfg,
            probe,
            dispatcher,
            waiting: WaitingQueue::new(),
            running: RunningSet::new(),
            slots: 0,
            finished: 0,
            tick: DEFAULT_TICK,
            log,
        }
    }

    /// Override the poll cadence. The default is [`DEFAULT_TICK`].
    pub fn set_tick(&mut self, tick: Duration) {
        self.tick = tick;
    }

    /// Add a job to the waiting queue; returns its zero-based index.
    /// Jobs are accepted only before [`Scheduler::run`] starts.
    pub fn enqueue(&mut self, job: JobSpec) -> usize {
        let path = job.path.clone();
        let index = self.waiting.enqueue(job);
        tracing::debug!(index, path = %path, "job enqueued");
        index
    }

    /// Total jobs enqueued for this run.
    pub fn job_count(&self) -> usize {
        self.waiting.enqueued()
    }

    /// Jobs observed as finished so far; never exceeds [`Scheduler::job_count`].
    pub fn finished_count(&self) -> usize {
        self.finished
    }

    /// Jobs currently dispatched and not yet finished.
    pub fn running_count(&self) -> usize {
        self.running.len()
    }
}
