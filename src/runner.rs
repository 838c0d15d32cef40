//! Lifecycle controller for one batch of jobs.
//!
//! A [`JobRunner`] is built from a batch of inputs and a processing function,
//! started once, and then either joined or killed:
//!
//! ```no_run
//! use job_runner::{JobRunner, PrintSink};
//!
//! let names = vec!["a", "b", "c"];
//! let mut runner = JobRunner::new(names, |name: &str, print: &PrintSink| {
//!     print.print(format!("deleting {name}"));
//!     Ok::<_, String>(Some(name.to_uppercase()))
//! })
//! .unwrap();
//!
//! runner.start().unwrap();
//! runner.join().unwrap();
//! assert_eq!(runner.output().len(), 3);
//! ```

use crate::config::RunnerConfig;
use crate::error::{CapturedFailure, Error, JobFailure, Result};
use crate::executor::failure::erase;
use crate::executor::{JobFn, PoolState, RunCounters, RunStats, Worker, WorkerPool};
use crate::queue::{BoundedPriorityQueue, Payload, Priority};
use crate::sink::{PrintSink, Sink};
use std::fmt::Display;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    /// Constructed, nothing enqueued yet.
    Built,
    /// Inputs enqueued and workers started.
    Running,
    /// `join` has returned.
    Drained,
}

impl RunnerState {
    fn as_str(self) -> &'static str {
        match self {
            RunnerState::Built => "built",
            RunnerState::Running => "running",
            RunnerState::Drained => "drained",
        }
    }
}

/// Cloneable handle that can stop a runner's workers from another thread.
pub struct KillSwitch<T> {
    queue: Arc<BoundedPriorityQueue<T>>,
    pool: Arc<PoolState>,
    poll_interval: Duration,
}

impl<T> KillSwitch<T> {
    /// Ask every worker to stop before it picks up another item.
    ///
    /// One stop signal is queued per started worker, ahead of all pending
    /// work. Invocations already running are not interrupted. With
    /// `blocking`, waits until every worker thread has exited.
    pub fn kill(&self, blocking: bool) {
        let workers = self.pool.spawned();
        if self.pool.all_finished() {
            tracing::debug!(workers, "kill requested but no worker is running");
            return;
        }

        tracing::info!(workers, blocking, "stopping workers");
        for _ in 0..workers {
            self.queue.put_urgent(Payload::Stop, Priority::STOP);
        }

        if blocking {
            while !self.pool.all_finished() {
                thread::sleep(self.poll_interval);
            }
        }
    }

    pub fn live_workers(&self) -> usize {
        self.pool.live()
    }
}

impl<T> Clone for KillSwitch<T> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            pool: self.pool.clone(),
            poll_interval: self.poll_interval,
        }
    }
}

impl<T> std::fmt::Debug for KillSwitch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KillSwitch")
            .field("live_workers", &self.pool.live())
            .finish()
    }
}

/// Runs one batch of inputs through a processing function on a pool of
/// worker threads.
pub struct JobRunner<T, R> {
    inputs: Vec<(Priority, T)>,
    job: Arc<JobFn<T, R>>,
    config: RunnerConfig,
    queue: Arc<BoundedPriorityQueue<T>>,
    output: Sink<R>,
    errors: Sink<CapturedFailure>,
    print: PrintSink,
    pool: WorkerPool,
    worker_count: usize,
    counters: Arc<RunCounters>,
    state: RunnerState,
}

impl<T, R> JobRunner<T, R>
where
    T: Send + 'static,
    R: Send + 'static,
{
    /// Runner with the default configuration and internally created sinks.
    pub fn new<I, F, E>(inputs: I, f: F) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        F: Fn(T, &PrintSink) -> std::result::Result<Option<R>, E> + Send + Sync + 'static,
        E: Display + 'static,
    {
        Self::builder(inputs, f).build()
    }

    pub fn builder<I, F, E>(inputs: I, f: F) -> JobRunnerBuilder<T, R>
    where
        I: IntoIterator<Item = T>,
        F: Fn(T, &PrintSink) -> std::result::Result<Option<R>, E> + Send + Sync + 'static,
        E: Display + 'static,
    {
        JobRunnerBuilder {
            inputs: inputs
                .into_iter()
                .map(|item| (Priority::DEFAULT, item))
                .collect(),
            job: erase(f),
            config: RunnerConfig::default(),
            print: None,
            errors: None,
            output: None,
        }
    }

    /// Enqueue every input and start the workers. Returns without waiting.
    ///
    /// If a worker thread cannot be spawned the runner stays `Built` with its
    /// inputs intact and nothing has been processed.
    pub fn start(&mut self) -> Result<&mut Self> {
        if self.state != RunnerState::Built {
            return Err(Error::InvalidState {
                op: "start",
                state: self.state.as_str(),
            });
        }

        // Workers wait on the gate until the whole pool exists, so a failed
        // spawn leaves the batch untouched.
        let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(self.worker_count);
        for id in 0..self.worker_count {
            let worker = Worker {
                id,
                queue: self.queue.clone(),
                job: self.job.clone(),
                output: self.output.clone(),
                errors: self.errors.clone(),
                print: self.print.clone(),
                counters: self.counters.clone(),
            };
            let gate = gate_rx.clone();
            let spawned = self.pool.spawn(move || {
                if gate.recv().is_ok() {
                    worker.run();
                }
            });

            if let Err(err) = spawned {
                tracing::error!(error = %err, "worker spawn failed, batch not started");
                drop(gate_tx);
                self.pool.reset();
                return Err(err);
            }
        }

        let num_inputs = self.inputs.len();
        // Capacity is at least the batch size, so none of these puts block.
        for (priority, item) in self.inputs.drain(..) {
            self.queue.put(Payload::Work(item), priority);
        }
        self.state = RunnerState::Running;

        tracing::debug!(
            inputs = num_inputs,
            workers = self.worker_count,
            capacity = self.queue.capacity(),
            "starting job runner"
        );

        for _ in 0..self.worker_count {
            let _ = gate_tx.send(());
        }

        Ok(self)
    }

    /// Block until every enqueued item is accounted for.
    ///
    /// Returns [`Error::JobFailure`] carrying every captured failure if any
    /// invocation failed. Must be called once, after `start`.
    pub fn join(&mut self) -> Result<()> {
        if self.state != RunnerState::Running {
            return Err(Error::InvalidState {
                op: "join",
                state: self.state.as_str(),
            });
        }

        self.wait_until_drained();
        self.pool.join_all();
        self.state = RunnerState::Drained;

        let failures = self.errors.drain();
        if failures.is_empty() {
            tracing::debug!(stats = ?self.stats(), "job runner drained");
            return Ok(());
        }

        tracing::warn!(failed = failures.len(), "job runner finished with failures");
        Err(JobFailure::new(failures).into())
    }

    fn wait_until_drained(&self) {
        let poll = self.config.kill_poll_interval;
        while !self.queue.wait_done_timeout(poll) {
            // Once every worker is gone, whatever is still queued (spare stop
            // signals, work cancelled by a kill) will never be picked up.
            if self.pool.all_finished() {
                self.discard_abandoned();
            }
        }
    }

    fn discard_abandoned(&self) {
        while let Some(item) = self.queue.try_get() {
            if let Payload::Work(_) = item.payload {
                self.counters.record_cancelled();
            }
            if let Err(err) = self.queue.mark_done() {
                tracing::error!(error = %err, "completion counter out of sync");
            }
        }
    }

    /// Stop workers early. See [`KillSwitch::kill`].
    pub fn kill(&self, blocking: bool) {
        self.kill_switch().kill(blocking);
    }

    pub fn kill_switch(&self) -> KillSwitch<T> {
        KillSwitch {
            queue: self.queue.clone(),
            pool: self.pool.state().clone(),
            poll_interval: self.config.kill_poll_interval,
        }
    }
}

impl<T, R> JobRunner<T, R> {
    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// Number of workers `start` launches for this batch.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn live_workers(&self) -> usize {
        self.pool.live()
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Items enqueued but not yet marked done.
    pub fn unfinished(&self) -> usize {
        self.queue.unfinished()
    }

    pub fn stats(&self) -> RunStats {
        self.counters.snapshot()
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn output(&self) -> &Sink<R> {
        &self.output
    }

    pub fn errors(&self) -> &Sink<CapturedFailure> {
        &self.errors
    }

    pub fn print_sink(&self) -> &PrintSink {
        &self.print
    }
}

impl<T, R> Drop for JobRunner<T, R> {
    fn drop(&mut self) {
        // Workers own clones of everything they touch, so they can finish in
        // the background; just make sure they stop taking new work.
        if self.state == RunnerState::Running && !self.pool.all_finished() {
            for _ in 0..self.pool.len() {
                self.queue.put_urgent(Payload::Stop, Priority::STOP);
            }
        }
    }
}

impl<T, R> std::fmt::Debug for JobRunner<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRunner")
            .field("state", &self.state)
            .field("worker_count", &self.worker_count)
            .field("unfinished", &self.queue.unfinished())
            .field("pool", &self.pool)
            .finish()
    }
}

pub struct JobRunnerBuilder<T, R> {
    inputs: Vec<(Priority, T)>,
    job: Box<JobFn<T, R>>,
    config: RunnerConfig,
    print: Option<PrintSink>,
    errors: Option<Sink<CapturedFailure>>,
    output: Option<Sink<R>>,
}

impl<T, R> JobRunnerBuilder<T, R> {
    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing print sink. It is used as-is, whatever its capacity.
    pub fn print_sink(mut self, sink: PrintSink) -> Self {
        self.print = Some(sink);
        self
    }

    /// Share an existing error sink. It is used as-is, whatever its capacity.
    pub fn error_sink(mut self, sink: Sink<CapturedFailure>) -> Self {
        self.errors = Some(sink);
        self
    }

    /// Share an existing output sink. It is used as-is, whatever its capacity.
    pub fn output_sink(mut self, sink: Sink<R>) -> Self {
        self.output = Some(sink);
        self
    }

    /// Assign each input a priority; lower values are processed first.
    pub fn prioritize<P>(mut self, priority_of: P) -> Self
    where
        P: Fn(&T) -> Priority,
    {
        for (priority, item) in &mut self.inputs {
            *priority = priority_of(item);
        }
        self
    }

    pub fn build(self) -> Result<JobRunner<T, R>> {
        self.config.validate()?;

        let num_inputs = self.inputs.len();
        let capacity = self.config.queue_capacity_for(num_inputs);
        let worker_count = self.config.worker_count(num_inputs);

        let print = self.print.unwrap_or_else(|| {
            if self.config.unbounded_print {
                Sink::unbounded()
            } else {
                Sink::bounded(capacity)
            }
        });

        Ok(JobRunner {
            inputs: self.inputs,
            job: Arc::from(self.job),
            queue: Arc::new(BoundedPriorityQueue::new(capacity)),
            output: self.output.unwrap_or_else(|| Sink::bounded(capacity)),
            errors: self.errors.unwrap_or_else(|| Sink::bounded(capacity)),
            print,
            pool: WorkerPool::new(
                self.config.thread_name_prefix.clone(),
                self.config.stack_size,
            ),
            worker_count,
            counters: Arc::new(RunCounters::new()),
            state: RunnerState::Built,
            config: self.config,
        })
    }
}

impl<T, R> std::fmt::Debug for JobRunnerBuilder<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRunnerBuilder")
            .field("inputs", &self.inputs.len())
            .field("config", &self.config)
            .finish()
    }
}
