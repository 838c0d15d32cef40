use super::worker::WorkerId;
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Worker bookkeeping that can be read without owning the pool.
#[derive(Debug, Default)]
pub struct PoolState {
    spawned: AtomicUsize,
    live: AtomicUsize,
}

impl PoolState {
    /// Workers started over the pool's lifetime.
    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::Acquire)
    }

    /// Workers whose thread has not yet returned.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    pub fn all_finished(&self) -> bool {
        self.live() == 0
    }
}

// Decrements the live count when the worker thread returns or unwinds.
struct LiveGuard(Arc<PoolState>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.live.fetch_sub(1, Ordering::AcqRel);
    }
}

struct WorkerHandle {
    id: WorkerId,
    thread: Option<JoinHandle<()>>,
}

/// Fixed set of named worker threads.
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    state: Arc<PoolState>,
    thread_name_prefix: String,
    stack_size: Option<usize>,
}

impl WorkerPool {
    pub fn new(thread_name_prefix: impl Into<String>, stack_size: Option<usize>) -> Self {
        Self {
            workers: Vec::new(),
            state: Arc::new(PoolState::default()),
            thread_name_prefix: thread_name_prefix.into(),
            stack_size,
        }
    }

    pub fn state(&self) -> &Arc<PoolState> {
        &self.state
    }

    /// Start one worker thread running `f`.
    pub fn spawn<F>(&mut self, f: F) -> Result<WorkerId>
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.workers.len();
        let name = format!("{}-{}", self.thread_name_prefix, id);

        let mut builder = thread::Builder::new().name(name);
        if let Some(stack_size) = self.stack_size {
            builder = builder.stack_size(stack_size);
        }

        // Count the worker as live before it runs so `all_finished` never
        // reports a worker that simply has not been scheduled yet.
        self.state.live.fetch_add(1, Ordering::AcqRel);
        let guard = LiveGuard(self.state.clone());

        let thread = builder
            .spawn(move || {
                let _guard = guard;
                f();
            })
            .map_err(|e| {
                // The closure, and with it the guard, was dropped by the failed spawn.
                Error::spawn(format!("worker {}: {}", id, e))
            })?;

        self.state.spawned.fetch_add(1, Ordering::AcqRel);
        self.workers.push(WorkerHandle {
            id,
            thread: Some(thread),
        });
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn live(&self) -> usize {
        self.state.live()
    }

    pub fn all_finished(&self) -> bool {
        self.state.all_finished()
    }

    /// Wait for every worker thread to return.
    pub fn join_all(&mut self) {
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    tracing::error!(worker = worker.id, "worker thread panicked");
                }
            }
        }
    }

    /// Forget every joined worker so the pool can be filled again.
    pub fn reset(&mut self) {
        self.join_all();
        self.workers.clear();
        self.state.spawned.store(0, Ordering::Release);
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .field("live", &self.state.live())
            .field("thread_name_prefix", &self.thread_name_prefix)
            .finish()
    }
}
