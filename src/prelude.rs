pub use crate::config::{RunnerConfig, RunnerConfigBuilder};
pub use crate::error::{CapturedFailure, Error, JobFailure, Result};
pub use crate::queue::Priority;
pub use crate::runner::{JobRunner, KillSwitch, RunnerState};
pub use crate::sink::{PrintSink, Sink};
