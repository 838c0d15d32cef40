// worker loop
use super::failure::{invoke, JobFn};
use super::stats::RunCounters;
use crate::error::CapturedFailure;
use crate::queue::{BoundedPriorityQueue, Payload};
use crate::sink::{PrintSink, Sink};
use std::sync::Arc;

pub type WorkerId = usize;

/// Marks one dequeued item done when dropped, whatever happened to it.
struct DoneGuard<'a, T> {
    queue: &'a BoundedPriorityQueue<T>,
}

impl<T> Drop for DoneGuard<'_, T> {
    fn drop(&mut self) {
        if let Err(err) = self.queue.mark_done() {
            tracing::error!(error = %err, "completion counter out of sync");
        }
    }
}

pub(crate) struct Worker<T, R> {
    pub id: WorkerId,
    pub queue: Arc<BoundedPriorityQueue<T>>,
    pub job: Arc<JobFn<T, R>>,
    pub output: Sink<R>,
    pub errors: Sink<CapturedFailure>,
    pub print: PrintSink,
    pub counters: Arc<RunCounters>,
}

impl<T, R> Worker<T, R> {
    // main loop
    pub fn run(self) {
        tracing::trace!(worker = self.id, "worker started");
        let mut handled = 0u64;

        // The batch is submitted up front, so an empty queue means no more work.
        while let Some(item) = self.queue.try_get() {
            let _done = DoneGuard {
                queue: &self.queue,
            };

            let work = match item.payload {
                Payload::Stop => {
                    tracing::trace!(worker = self.id, "stop signal received");
                    break;
                }
                Payload::Work(work) => work,
            };

            handled += 1;
            match invoke(&*self.job, work, &self.print) {
                Ok(Some(result)) => {
                    self.counters.record_success();
                    self.output.put(result);
                }
                Ok(None) => self.counters.record_success(),
                Err(failure) => {
                    tracing::warn!(
                        worker = self.id,
                        kind = %failure.kind,
                        "job failed: {}",
                        failure.message
                    );
                    self.counters.record_failure();
                    self.errors.put(failure);
                }
            }
        }

        tracing::trace!(worker = self.id, handled, "worker exiting");
    }
}
