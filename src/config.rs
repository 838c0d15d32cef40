use crate::error::{Error, Result};
use std::time::Duration;

/// Values accepted as `true` by [`config_true_value`].
pub const TRUE_VALUES: &[&str] = &["true", "1", "yes", "on", "t", "y"];

pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;
pub const DEFAULT_CPU_MULTIPLIER: usize = 4;

pub const ENV_MAX_WORKERS: &str = "JOB_RUNNER_MAX_WORKERS";
pub const ENV_CPU_MULTIPLIER: &str = "JOB_RUNNER_CPU_MULTIPLIER";
pub const ENV_QUEUE_CAPACITY: &str = "JOB_RUNNER_QUEUE_CAPACITY";
pub const ENV_THREAD_PREFIX: &str = "JOB_RUNNER_THREAD_PREFIX";
pub const ENV_UNBOUNDED_PRINT: &str = "JOB_RUNNER_UNBOUNDED_PRINT";

/// Returns true if `value` is one of [`TRUE_VALUES`], ignoring case.
pub fn config_true_value(value: &str) -> bool {
    let value = value.trim();
    TRUE_VALUES.iter().any(|t| t.eq_ignore_ascii_case(value))
}

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Upper bound on worker threads. `None` means cores × `cpu_multiplier`.
    pub max_workers: Option<usize>,
    pub cpu_multiplier: usize,
    /// Minimum capacity of the work queue and of internally created sinks.
    pub queue_capacity: usize,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
    /// How often `kill(true)` checks worker liveness.
    pub kill_poll_interval: Duration,
    /// Create the internal print sink without a bound.
    pub unbounded_print: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_workers: None,
            cpu_multiplier: DEFAULT_CPU_MULTIPLIER,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            thread_name_prefix: "job-worker".to_string(),
            stack_size: None,
            kill_poll_interval: Duration::from_millis(10),
            unbounded_print: false,
        }
    }
}

impl RunnerConfig {
    pub fn builder() -> RunnerConfigBuilder {
        RunnerConfigBuilder::new()
    }

    /// Defaults overlaid with the `JOB_RUNNER_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup(ENV_MAX_WORKERS) {
            config.max_workers = Some(parse_usize(ENV_MAX_WORKERS, &v)?);
        }
        if let Some(v) = lookup(ENV_CPU_MULTIPLIER) {
            config.cpu_multiplier = parse_usize(ENV_CPU_MULTIPLIER, &v)?;
        }
        if let Some(v) = lookup(ENV_QUEUE_CAPACITY) {
            config.queue_capacity = parse_usize(ENV_QUEUE_CAPACITY, &v)?;
        }
        if let Some(v) = lookup(ENV_THREAD_PREFIX) {
            config.thread_name_prefix = v;
        }
        if let Some(v) = lookup(ENV_UNBOUNDED_PRINT) {
            config.unbounded_print = config_true_value(&v);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == Some(0) {
            return Err(Error::config("max_workers must be > 0"));
        }
        if self.cpu_multiplier == 0 {
            return Err(Error::config("cpu_multiplier must be > 0"));
        }
        if self.queue_capacity == 0 {
            return Err(Error::config("queue_capacity must be > 0"));
        }
        if self.thread_name_prefix.is_empty() {
            return Err(Error::config("thread_name_prefix must not be empty"));
        }
        Ok(())
    }

    /// Number of workers to start for a batch of `num_inputs` items.
    ///
    /// Never more than `num_inputs`, so an empty batch starts no workers.
    pub fn worker_count(&self, num_inputs: usize) -> usize {
        let wanted = self
            .max_workers
            .unwrap_or_else(|| num_cpus::get().saturating_mul(self.cpu_multiplier));
        wanted.min(num_inputs)
    }

    /// Capacity of the work queue for a batch of `num_inputs` items.
    ///
    /// Grows to fit the whole batch so the initial submission cannot block.
    pub fn queue_capacity_for(&self, num_inputs: usize) -> usize {
        self.queue_capacity.max(num_inputs)
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::config(format!("{key}={value:?}: {e}")))
}

#[derive(Debug, Default)]
pub struct RunnerConfigBuilder {
    config: RunnerConfig,
}

impl RunnerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RunnerConfig::default(),
        }
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.max_workers = Some(n);
        self
    }

    pub fn cpu_multiplier(mut self, n: usize) -> Self {
        self.config.cpu_multiplier = n;
        self
    }

    pub fn queue_capacity(mut self, n: usize) -> Self {
        self.config.queue_capacity = n;
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn kill_poll_interval(mut self, interval: Duration) -> Self {
        self.config.kill_poll_interval = interval;
        self
    }

    pub fn unbounded_print(mut self, unbounded: bool) -> Self {
        self.config.unbounded_print = unbounded;
        self
    }

    pub fn build(self) -> Result<RunnerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_true_value() {
        for v in ["true", "TRUE", "1", "yes", "On", "t", "Y", " y "] {
            assert!(config_true_value(v), "{v:?} should be true");
        }
        for v in ["false", "0", "no", "", "2", "enabled"] {
            assert!(!config_true_value(v), "{v:?} should be false");
        }
    }

    #[test]
    fn test_worker_count_clamped_to_inputs() {
        let config = RunnerConfig::builder().max_workers(16).build().unwrap();
        assert_eq!(config.worker_count(3), 3);
        assert_eq!(config.worker_count(100), 16);
        assert_eq!(config.worker_count(0), 0);
    }

    #[test]
    fn test_default_worker_count_uses_cores() {
        let config = RunnerConfig::builder().cpu_multiplier(2).build().unwrap();
        assert_eq!(config.worker_count(usize::MAX), num_cpus::get() * 2);
    }

    #[test]
    fn test_queue_capacity_grows_with_inputs() {
        let config = RunnerConfig::default();
        assert_eq!(config.queue_capacity_for(5), DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.queue_capacity_for(50_000), 50_000);
    }

    #[test]
    fn test_validation() {
        assert!(RunnerConfig::builder().max_workers(0).build().is_err());
        assert!(RunnerConfig::builder().cpu_multiplier(0).build().is_err());
        assert!(RunnerConfig::builder().queue_capacity(0).build().is_err());
        assert!(RunnerConfig::builder().thread_name_prefix("").build().is_err());
        assert!(RunnerConfig::builder().build().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let config = RunnerConfig::from_lookup(lookup_from(&[
            (ENV_MAX_WORKERS, "8"),
            (ENV_QUEUE_CAPACITY, " 20 "),
            (ENV_THREAD_PREFIX, "swift"),
            (ENV_UNBOUNDED_PRINT, "yes"),
        ]))
        .unwrap();

        assert_eq!(config.max_workers, Some(8));
        assert_eq!(config.queue_capacity, 20);
        assert_eq!(config.cpu_multiplier, DEFAULT_CPU_MULTIPLIER);
        assert_eq!(config.thread_name_prefix, "swift");
        assert!(config.unbounded_print);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = RunnerConfig::from_lookup(lookup_from(&[(ENV_MAX_WORKERS, "lots")]));
        assert!(matches!(err, Err(Error::Config(_))));

        let err = RunnerConfig::from_lookup(lookup_from(&[(ENV_CPU_MULTIPLIER, "0")]));
        assert!(matches!(err, Err(Error::Config(_))));
    }
}
