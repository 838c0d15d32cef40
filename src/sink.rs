//! Bounded FIFO queues that carry results out of the worker pool.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TryRecvError};
use std::fmt;
use std::time::Duration;

/// Cloneable handle to a FIFO queue shared between workers and a consumer.
///
/// Clones refer to the same queue. A bounded sink blocks `put` while it is
/// full, which throttles workers until the consumer catches up.
pub struct Sink<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

/// Sink for free-form progress text written by processing functions.
pub type PrintSink = Sink<String>;

impl<T> Sink<T> {
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx }
    }

    pub fn unbounded() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Append a value, blocking while the sink is full.
    pub fn put(&self, value: T) {
        let _ = self.tx.send(value);
    }

    /// Append a value without blocking. Gives the value back if the sink is full.
    pub fn try_put(&self, value: T) -> Result<(), T> {
        self.tx.try_send(value).map_err(|e| e.into_inner())
    }

    pub fn try_take(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn take_timeout(&self, timeout: Duration) -> Option<T> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Remove and return everything currently queued, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.rx.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// `None` for an unbounded sink.
    pub fn capacity(&self) -> Option<usize> {
        self.rx.capacity()
    }
}

impl Sink<String> {
    pub fn print(&self, line: impl Into<String>) {
        self.put(line.into());
    }
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<T> fmt::Debug for Sink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
