//! job-runner - bounded, priority-ordered parallel job runner
//!
//! Runs one batch of inputs through a caller-supplied processing function on
//! a fixed pool of worker threads. Results, failures and free-form progress
//! messages come back through three independent sinks, and `join` reports
//! every failure of the batch as a single aggregate error.
//!
//! # Quick Start
//!
//! ```no_run
//! use job_runner::prelude::*;
//!
//! let objects = vec!["a.txt", "b.txt", "c.txt"];
//! let mut runner = JobRunner::new(objects, |name: &str, print: &PrintSink| {
//!     print.print(format!("deleted {name}"));
//!     Ok::<_, String>(Some(name.len()))
//! })
//! .unwrap();
//!
//! runner.start().unwrap();
//! match runner.join() {
//!     Ok(()) => println!("{} results", runner.output().len()),
//!     Err(Error::JobFailure(failure)) => eprintln!("{}", failure),
//!     Err(e) => eprintln!("runner error: {}", e),
//! }
//! ```
//!
//! # Features
//!
//! - **Priority queue**: lower priority values first, FIFO within a priority
//! - **Bounded sinks**: slow consumers apply backpressure to workers
//! - **Failure isolation**: errors and panics are captured per item
//! - **Cooperative kill**: stop signals jump ahead of pending work

#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod queue;
pub mod runner;
pub mod sink;

pub use config::{config_true_value, RunnerConfig, RunnerConfigBuilder};
pub use error::{CapturedFailure, Error, JobFailure, Result};
pub use executor::RunStats;
pub use queue::{BoundedPriorityQueue, Payload, Priority, QueueItem};
pub use runner::{JobRunner, JobRunnerBuilder, KillSwitch, RunnerState};
pub use sink::{PrintSink, Sink};
