use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every worker of one runner.
#[derive(Debug, Default)]
pub struct RunCounters {
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
    pub cancelled: AtomicU64,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancelled(&self) {
        self.cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RunStats {
        let succeeded = self.succeeded.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        RunStats {
            processed: succeeded + failed,
            succeeded,
            failed,
            cancelled: self.cancelled.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Invocations of the processing function that returned or panicked.
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Work items left in the queue after a kill and never processed.
    pub cancelled: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let counters = RunCounters::new();
        counters.record_success();
        counters.record_success();
        counters.record_failure();
        counters.record_cancelled();

        assert_eq!(
            counters.snapshot(),
            RunStats {
                processed: 3,
                succeeded: 2,
                failed: 1,
                cancelled: 1,
            }
        );
    }
}
