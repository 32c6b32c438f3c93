//! Worker - main poll / execute / wait loop

use crate::error::{Result, WorkerError};
use crate::manager::JobManager;
use crate::worker::signal::{install_shutdown_handler, ShutdownSignal};
use crate::worker::{JobFailurePolicy, WorkerConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Run loop states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// About to poll the manager
    Running,
    /// Idle before the next poll. `None` means poll again right away.
    Waiting(Option<Duration>),
    /// Shutdown observed; the loop has stopped
    Terminated,
}

/// Counters collected over the life of a run loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub polls: u64,
    pub jobs_run: u64,
    pub jobs_failed: u64,
    pub wait_slices: u64,
    pub manager_errors: u64,
}

enum PollOutcome {
    RanJob,
    NoJob,
    ManagerFailed(WorkerError),
}

enum WaitOutcome {
    Elapsed,
    Interrupted,
}

/// A named worker that pulls jobs from a [`JobManager`] one at a time
pub struct Worker {
    name: String,
    config: WorkerConfig,
    manager: Arc<dyn JobManager>,
    shutdown: ShutdownSignal,
}

impl Worker {
    /// Create a worker. Fails on a blank name or an unusable config.
    ///
    /// Construction has no side effects; signal handling is installed by [`Worker::run`].
    pub fn new(
        name: impl Into<String>,
        config: WorkerConfig,
        manager: Arc<dyn JobManager>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(WorkerError::InvalidConfiguration(
                "A worker name is required".to_string(),
            ));
        }
        config.validate()?;

        Ok(Self {
            name,
            config: config.normalized(),
            manager,
            shutdown: ShutdownSignal::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Get a handle to signal shutdown
    pub fn shutdown_handle(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Install the SIGTERM handler, then loop until shutdown is requested.
    pub async fn run(&self) -> Result<WorkerStats> {
        install_shutdown_handler(self.shutdown.clone())?;
        self.run_until_shutdown().await
    }

    /// Main worker loop, driven only by the shutdown flag.
    ///
    /// Returns the collected stats once the loop reaches `Terminated`, or the
    /// first job failure when the policy is [`JobFailurePolicy::Propagate`].
    pub async fn run_until_shutdown(&self) -> Result<WorkerStats> {
        info!("Starting worker '{}'...", self.name);
        match self.config.poll_interval_max {
            Some(max) => info!(
                "Poll interval max: {:?}, granularity: {:?}",
                max, self.config.poll_granularity
            ),
            None => warn!("Poll interval max unset: polling again immediately when idle"),
        }
        info!("On job failure: {}", self.config.failure_policy.as_str());

        let mut stats = WorkerStats::default();
        let mut state = WorkerState::Running;
        while state != WorkerState::Terminated {
            state = self.step(state, &mut stats).await?;
        }

        info!(
            "Worker '{}' stopped ({} polls, {} jobs, {} failed)",
            self.name, stats.polls, stats.jobs_run, stats.jobs_failed
        );
        Ok(stats)
    }

    /// Advance the state machine by one transition.
    pub async fn step(&self, state: WorkerState, stats: &mut WorkerStats) -> Result<WorkerState> {
        let next = match state {
            WorkerState::Running => {
                if self.shutdown.is_requested() {
                    info!("Shutdown requested, stopping worker '{}'...", self.name);
                    WorkerState::Terminated
                } else {
                    match self.poll(stats).await? {
                        PollOutcome::RanJob => WorkerState::Running,
                        PollOutcome::NoJob => WorkerState::Waiting(self.config.poll_interval_max),
                        PollOutcome::ManagerFailed(e) => {
                            warn!(
                                "[{}] - {}; retrying in {:?}",
                                self.name, e, self.config.manager_error_backoff
                            );
                            WorkerState::Waiting(Some(self.config.manager_error_backoff))
                        }
                    }
                }
            }
            WorkerState::Waiting(None) => {
                tokio::task::yield_now().await;
                WorkerState::Running
            }
            WorkerState::Waiting(Some(budget)) => match self.wait(budget, stats).await {
                WaitOutcome::Elapsed => WorkerState::Running,
                WaitOutcome::Interrupted => {
                    info!("Shutdown requested while idle, stopping worker '{}'...", self.name);
                    WorkerState::Terminated
                }
            },
            WorkerState::Terminated => WorkerState::Terminated,
        };

        debug!("[{}] {:?} -> {:?}", self.name, state, next);
        Ok(next)
    }

    /// Poll once and run at most one job (useful for testing with --once flag)
    ///
    /// Returns:
    /// - Ok(true) if a job was run
    /// - Ok(false) if no job was available
    /// - Err if the manager failed, or the job failed under `Propagate`
    pub async fn run_once(&self) -> Result<bool> {
        info!("Running worker '{}' in single-job mode...", self.name);
        let mut stats = WorkerStats::default();
        match self.poll(&mut stats).await? {
            PollOutcome::RanJob => Ok(true),
            PollOutcome::NoJob => Ok(false),
            PollOutcome::ManagerFailed(e) => Err(e),
        }
    }

    async fn poll(&self, stats: &mut WorkerStats) -> Result<PollOutcome> {
        stats.polls += 1;

        let mut job = match self.manager.fetch_next(&self.name).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                info!("[{}] - no job available", self.name);
                return Ok(PollOutcome::NoJob);
            }
            Err(e) => {
                stats.manager_errors += 1;
                let e = match e {
                    WorkerError::ManagerUnavailable(_) => e,
                    other => WorkerError::ManagerUnavailable(other.to_string()),
                };
                return Ok(PollOutcome::ManagerFailed(e));
            }
        };

        let job_id = job.id();
        info!("[{}] - executing job {}", self.name, job_id);

        // Runs to completion; shutdown is only observed once it returns.
        let result = job.run().await;
        stats.jobs_run += 1;

        match result {
            Ok(()) => {
                debug!("[{}] - job {} finished", self.name, job_id);
            }
            Err(e) => {
                stats.jobs_failed += 1;
                let failure = match e {
                    WorkerError::JobExecutionFailure { .. } => e,
                    other => WorkerError::JobExecutionFailure {
                        job_id: job_id.clone(),
                        message: other.to_string(),
                    },
                };
                error!("[{}] - {}", self.name, failure);

                if self.config.failure_policy == JobFailurePolicy::Propagate {
                    return Err(failure);
                }
            }
        }

        Ok(PollOutcome::RanJob)
    }

    /// Sleep up to `budget` in `poll_granularity` slices, checking the
    /// shutdown flag before and after every slice.
    async fn wait(&self, budget: Duration, stats: &mut WorkerStats) -> WaitOutcome {
        let slice = self.config.poll_granularity;
        let mut slept = Duration::ZERO;

        while slept < budget {
            if self.shutdown.is_requested() {
                return WaitOutcome::Interrupted;
            }
            sleep(slice).await;
            slept += slice;
            stats.wait_slices += 1;
            if self.shutdown.is_requested() {
                return WaitOutcome::Interrupted;
            }
        }

        WaitOutcome::Elapsed
    }
}
