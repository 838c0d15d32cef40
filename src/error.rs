use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("failed to spawn worker: {0}")]
    Spawn(String),

    #[error("cannot {op} a runner that is {state}")]
    InvalidState {
        op: &'static str,
        state: &'static str,
    },

    #[error("mark_done called more times than items were enqueued")]
    MarkDoneUnderflow,

    #[error(transparent)]
    JobFailure(#[from] JobFailure),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn spawn<S: Into<String>>(msg: S) -> Self {
        Error::Spawn(msg.into())
    }

    /// Returns the aggregate failure if this error came out of `join`.
    pub fn as_job_failure(&self) -> Option<&JobFailure> {
        match self {
            Error::JobFailure(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Context captured when one invocation of the processing function fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFailure {
    /// Type name of the returned error, or `"panic"`.
    pub kind: String,
    pub message: String,
    /// Rendered backtrace taken at the capture point.
    pub stack: String,
}

impl CapturedFailure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            stack: stack.into(),
        }
    }
}

impl fmt::Display for CapturedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<kind: {}, message: {}, trace: {}>",
            self.kind, self.message, self.stack
        )
    }
}

/// Every per-item failure of one batch, in the order they were collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFailure {
    failures: Vec<CapturedFailure>,
}

impl JobFailure {
    pub fn new(failures: Vec<CapturedFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[CapturedFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_failures(self) -> Vec<CapturedFailure> {
        self.failures
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} job(s) failed: ", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for JobFailure {}
