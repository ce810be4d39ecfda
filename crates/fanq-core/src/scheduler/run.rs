//! The run loop: initial burst, sleep/poll cadence, timeout, summary.

use std::time::Instant;

use crate::poll::{self, PollStatus};
use crate::transport::DispatchError;

use super::Scheduler;

impl Scheduler {
    /// Drive the queue until every job finishes or the timeout elapses.
    /// Blocks the calling thread for the whole run and returns the
    /// accumulated run log as one text blob.
    ///
    /// A connection that cannot be established aborts the run and
    /// propagates; an admission deferral only postpones dispatch to a
    /// later tick.
    pub fn run(&mut self) -> Result<String, DispatchError> {
        let start = Instant::now();
        let job_count = self.job_count();
        self.slots = self.cfg.max_jobs.max(1).min(job_count);
        self.log.append(format!("Job count is {job_count}."));
        tracing::info!(job_count, slots = self.slots, "queue starting");

        let outcome = self.drive(start, job_count);

        // No connection outlives the run; this covers the timeout path and
        // a fatal dispatch failure alike.
        let abandoned = self.running.close_all();
        if abandoned > 0 {
            self.log
                .append(format!("Closed {abandoned} unfinished connections."));
        }
        outcome?;

        let elapsed = start.elapsed().as_secs_f64();
        self.log.append(format!(
            "Finished after {elapsed:.2} seconds. {} jobs completed.",
            self.finished
        ));
        tracing::info!(finished = self.finished, job_count, elapsed, "queue done");
        Ok(self.log.to_text())
    }

    /// The tick loop. Returns early only on a fatal dispatch failure.
    fn drive(&mut self, start: Instant, job_count: usize) -> Result<(), DispatchError> {
        // Initial burst: fill every slot before the first tick.
        self.fill_slots()?;

        while self.finished < job_count {
            std::thread::sleep(self.tick);
            self.poll_running();
            self.fill_slots()?;

            if let Some(limit) = self.cfg.timeout() {
                if start.elapsed() > limit {
                    self.log.append("Timeout reached.");
                    tracing::warn!(
                        elapsed_secs = start.elapsed().as_secs_f64(),
                        finished = self.finished,
                        job_count,
                        "queue timed out"
                    );
                    break;
                }
            }
        }
        Ok(())
    }

    /// Poll every running job in ascending dispatch order, then retire the
    /// finished ones: remove from the running set, bump the finished count,
    /// and return the freed slot to the budget.
    fn poll_running(&mut self) {
        let mut retired: Vec<usize> = Vec::new();
        for (index, handle) in self.running.iter_mut() {
            match poll::poll(handle) {
                PollStatus::Finished => retired.push(*index),
                PollStatus::AlreadyClosed => {
                    self.log
                        .append(format!("Job {index} was already closed when polled."));
                    tracing::warn!(index = *index, "handle already closed when polled");
                    retired.push(*index);
                }
                PollStatus::Active(bytes) => {
                    if !bytes.is_empty() {
                        self.log.append(format!(
                            "Status of job {index} is {}",
                            String::from_utf8_lossy(&bytes).trim_end()
                        ));
                    }
                }
            }
        }
        for index in retired {
            self.running.remove(index);
            self.finished += 1;
            self.slots += 1;
            self.log.append(format!(
                "Job {index} finished. Finished count is {}; slots are {}.",
                self.finished, self.slots
            ));
        }
    }
}
