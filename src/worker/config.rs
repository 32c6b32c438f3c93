//! Worker configuration

use crate::error::{Result, WorkerError};
use std::str::FromStr;
use std::time::Duration;

/// What the worker does when a job's `run` returns an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobFailurePolicy {
    /// Log the failure and keep polling
    #[default]
    Continue,
    /// Stop the loop and return the failure, leaving restarts to a supervisor
    Propagate,
}

impl JobFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobFailurePolicy::Continue => "continue",
            JobFailurePolicy::Propagate => "propagate",
        }
    }
}

impl FromStr for JobFailurePolicy {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "continue" => Ok(JobFailurePolicy::Continue),
            "propagate" => Ok(JobFailurePolicy::Propagate),
            other => Err(WorkerError::ConfigError(format!(
                "unknown job failure policy '{}' (expected 'continue' or 'propagate')",
                other
            ))),
        }
    }
}

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Longest wait before polling again when no job was available.
    /// `None` means poll again immediately.
    pub poll_interval_max: Option<Duration>,

    /// Slice length used to check for shutdown while waiting
    pub poll_granularity: Duration,

    /// Wait applied after the manager itself fails
    pub manager_error_backoff: Duration,

    /// Handling of failed jobs
    pub failure_policy: JobFailurePolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_max: None,
            poll_granularity: Duration::from_secs(1),
            manager_error_backoff: Duration::from_secs(10),
            failure_policy: JobFailurePolicy::Continue,
        }
    }
}

impl WorkerConfig {
    /// Create a new config builder
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }

    /// Reject values the run loop cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.poll_granularity.is_zero() {
            return Err(WorkerError::InvalidConfiguration(
                "poll granularity must be greater than zero".to_string(),
            ));
        }
        if self.manager_error_backoff.is_zero() {
            return Err(WorkerError::InvalidConfiguration(
                "manager error backoff must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// A zero idle wait means the same as no wait: poll immediately.
    pub fn normalized(mut self) -> Self {
        if self.poll_interval_max.is_some_and(|max| max.is_zero()) {
            self.poll_interval_max = None;
        }
        self
    }
}

/// Builder for WorkerConfig
#[derive(Default)]
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    /// Set the maximum idle wait
    pub fn poll_interval_max(mut self, duration: Duration) -> Self {
        self.config.poll_interval_max = Some(duration);
        self
    }

    /// Set the maximum idle wait in seconds
    pub fn poll_interval_max_secs(mut self, secs: u64) -> Self {
        self.config.poll_interval_max = Some(Duration::from_secs(secs));
        self
    }

    /// Poll again as soon as the manager reports no work
    pub fn poll_immediately(mut self) -> Self {
        self.config.poll_interval_max = None;
        self
    }

    /// Set the shutdown-check slice
    pub fn poll_granularity(mut self, duration: Duration) -> Self {
        self.config.poll_granularity = duration;
        self
    }

    /// Set the shutdown-check slice in seconds
    pub fn poll_granularity_secs(mut self, secs: u64) -> Self {
        self.config.poll_granularity = Duration::from_secs(secs);
        self
    }

    /// Set the wait after a manager error
    pub fn manager_error_backoff(mut self, duration: Duration) -> Self {
        self.config.manager_error_backoff = duration;
        self
    }

    /// Set the job failure policy
    pub fn failure_policy(mut self, policy: JobFailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// Build the config
    pub fn build(self) -> WorkerConfig {
        self.config.normalized()
    }
}
