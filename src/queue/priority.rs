use super::item::{Payload, Priority, QueueItem};
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Entry<T> {
    seq: u64,
    item: QueueItem<T>,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // BinaryHeap pops the max: stop signals first, then lowest (priority, seq).
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.item
            .payload
            .is_stop()
            .cmp(&other.item.payload.is_stop())
            .then_with(|| other.item.priority.cmp(&self.item.priority))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug)]
struct Inner<T> {
    heap: BinaryHeap<Entry<T>>,
    next_seq: u64,
    unfinished: usize,
}

/// Thread-safe priority queue with a capacity bound and a completion counter.
///
/// Every `put` raises the counter by one and every `mark_done` lowers it by
/// one; `wait_done` returns once it is back at zero. Callers must call
/// `mark_done` exactly once per dequeued item.
#[derive(Debug)]
pub struct BoundedPriorityQueue<T> {
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    all_done: Condvar,
    capacity: usize,
}

impl<T> BoundedPriorityQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                heap: BinaryHeap::with_capacity(capacity.min(1 << 16)),
                next_seq: 0,
                unfinished: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            all_done: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    /// Enqueue, blocking while the queue holds `capacity` items.
    pub fn put(&self, payload: Payload<T>, priority: Priority) {
        let mut inner = self.inner.lock();
        while inner.heap.len() >= self.capacity {
            self.not_full.wait(&mut inner);
        }
        self.push_locked(&mut inner, QueueItem { priority, payload });
    }

    /// Enqueue without waiting for space. Stop signals go through here so a
    /// kill request is never stuck behind a full queue.
    pub fn put_urgent(&self, payload: Payload<T>, priority: Priority) {
        let mut inner = self.inner.lock();
        self.push_locked(&mut inner, QueueItem { priority, payload });
    }

    fn push_locked(&self, inner: &mut Inner<T>, item: QueueItem<T>) {
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.heap.push(Entry { seq, item });
        inner.unfinished += 1;
        self.not_empty.notify_one();
    }

    /// Dequeue the most urgent item, blocking while the queue is empty.
    pub fn get(&self) -> QueueItem<T> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(entry) = inner.heap.pop() {
                self.not_full.notify_one();
                return entry.item;
            }
            self.not_empty.wait(&mut inner);
        }
    }

    /// Dequeue the most urgent item, or `None` if the queue is empty.
    pub fn try_get(&self) -> Option<QueueItem<T>> {
        let entry = self.inner.lock().heap.pop()?;
        self.not_full.notify_one();
        Some(entry.item)
    }

    /// Record that one dequeued item has been fully handled.
    pub fn mark_done(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.unfinished == 0 {
            return Err(Error::MarkDoneUnderflow);
        }
        inner.unfinished -= 1;
        if inner.unfinished == 0 {
            self.all_done.notify_all();
        }
        Ok(())
    }

    /// Block until every enqueued item has been marked done.
    pub fn wait_done(&self) {
        let mut inner = self.inner.lock();
        while inner.unfinished > 0 {
            self.all_done.wait(&mut inner);
        }
    }

    /// Like [`wait_done`](Self::wait_done) but gives up after `timeout`.
    /// Returns true if the counter reached zero.
    pub fn wait_done_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        while inner.unfinished > 0 {
            if self.all_done.wait_until(&mut inner, deadline).timed_out() {
                return inner.unfinished == 0;
            }
        }
        true
    }

    /// Items enqueued but not yet marked done.
    pub fn unfinished(&self) -> usize {
        self.inner.lock().unfinished
    }

    /// Items currently waiting in the queue.
    pub fn len(&self) -> usize {
        self.inner.lock().heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().heap.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
