//! The filling pass: admit and dispatch jobs into free slots.

use crate::load;
use crate::transport::DispatchError;

use super::Scheduler;

impl Scheduler {
    /// Dispatch jobs while slots remain. Each attempt re-samples the load;
    /// the pass stops on the first admission deferral (retried next tick,
    /// nothing is dequeued) or when the waiting queue is empty. A dispatch
    /// failure is fatal to the run: logged, then propagated.
    pub(super) fn fill_slots(&mut self) -> Result<usize, DispatchError> {
        let mut started = 0;
        while self.slots > 0 {
            let current = self.probe.one_minute();
            if !load::admits(current, self.cfg.min_load) {
                self.log
                    .append(format!("Load is {current:.2}. Not starting a job yet."));
                tracing::debug!(
                    load = current,
                    ceiling = self.cfg.min_load,
                    "admission deferred"
                );
                break;
            }
            let Some((index, job)) = self.waiting.pop_next() else {
                break;
            };
            self.log.append(format!(
                "Starting job {index} with URL: {}",
                job.request_target()
            ));
            let handle = match self.dispatcher.dispatch(&job) {
                Ok(handle) => handle,
                Err(e) => {
                    self.log.append(format!("Dispatching job {index} failed: {e}"));
                    return Err(e);
                }
            };
            self.running.insert(index, handle);
            self.slots -= 1;
            started += 1;
            tracing::debug!(
                index,
                slots = self.slots,
                waiting = self.waiting.len(),
                "job dispatched"
            );
        }
        Ok(started)
    }
}
