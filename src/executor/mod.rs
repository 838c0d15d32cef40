//! Worker threads and the pool that owns them.
//!
//! Workers pull from the shared priority queue until it is empty or they
//! receive a stop signal. Each invocation of the processing function is
//! isolated: returned errors and panics become [`CapturedFailure`]s on the
//! error sink and the worker moves on to the next item.
//!
//! [`CapturedFailure`]: crate::error::CapturedFailure

pub mod failure;
pub mod pool;
pub mod stats;
pub mod worker;

pub use failure::{capture_error, invoke};
pub use pool::{PoolState, WorkerPool};
pub use stats::{RunCounters, RunStats};

pub(crate) use failure::JobFn;
pub(crate) use worker::Worker;
