//! JobManager implementation over the jobs table

use crate::db::jobs;
use crate::db::models::{JobResult, QueuedJob};
use crate::db::DbPool;
use crate::error::{Result, WorkerError};
use crate::manager::{Job, JobManager};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// Hands out jobs from Postgres, claiming each one for the polling worker
#[derive(Clone)]
pub struct PgJobManager {
    pool: DbPool,
}

impl PgJobManager {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobManager for PgJobManager {
    async fn fetch_next(&self, worker_name: &str) -> Result<Option<Box<dyn Job>>> {
        let job = jobs::claim_next_job(&self.pool, worker_name).await?;

        Ok(job.map(|job| {
            debug!("Claimed job {} for {}: {}", job.id, worker_name, job.command);
            Box::new(ShellJob::new(self.pool.clone(), job)) as Box<dyn Job>
        }))
    }
}

/// A claimed job whose body is a shell command
///
/// Bookkeeping writes after the claim are best-effort: a database error is
/// logged and never hides what happened to the command itself.
pub struct ShellJob {
    pool: DbPool,
    job: QueuedJob,
}

impl ShellJob {
    pub fn new(pool: DbPool, job: QueuedJob) -> Self {
        Self { pool, job }
    }

    fn failure(&self, message: String) -> WorkerError {
        WorkerError::JobExecutionFailure {
            job_id: self.id(),
            message,
        }
    }
}

#[async_trait]
impl Job for ShellJob {
    fn id(&self) -> String {
        self.job.id.to_string()
    }

    async fn run(&mut self) -> Result<()> {
        let job_id = self.job.id;

        if let Err(e) = jobs::start_job(&self.pool, job_id).await {
            // Not started: hand the claim back so the job is not stuck instantiated.
            match jobs::release_job(&self.pool, job_id).await {
                Ok(()) => warn!("Job {} could not be started, returned to queue: {}", job_id, e),
                Err(release_err) => error!(
                    "Job {} could not be started ({}) nor returned to queue: {}",
                    job_id, e, release_err
                ),
            }
            return Err(self.failure(format!("could not mark job started: {}", e)));
        }

        let result = match run_command(&self.job.command).await {
            Ok(result) => result,
            Err(e) => {
                if let Err(db_err) = jobs::error_job(&self.pool, job_id, &e.to_string()).await {
                    error!("Failed to record error for job {}: {}", job_id, db_err);
                }
                return Err(self.failure(format!("could not start command: {}", e)));
            }
        };

        if let Err(e) = jobs::finish_job(&self.pool, job_id, &result).await {
            error!(
                "Failed to record result of job {} (exit code {}): {}",
                job_id, result.code, e
            );
        }

        command_outcome(&self.id(), &result)
    }
}

/// Map a finished command to the job's outcome
fn command_outcome(job_id: &str, result: &JobResult) -> Result<()> {
    if result.succeeded() {
        info!("Job {} completed successfully", job_id);
        Ok(())
    } else {
        Err(WorkerError::JobExecutionFailure {
            job_id: job_id.to_string(),
            message: format!(
                "command exited with code {}: {}",
                result.code,
                result.error.trim()
            ),
        })
    }
}

/// Run `command` through `sh -c` and capture its result.
///
/// A process killed by a signal reports code -1.
pub async fn run_command(command: &str) -> Result<JobResult> {
    let output = Command::new("sh").arg("-c").arg(command).output().await?;

    Ok(JobResult {
        code: output.status.code().unwrap_or(-1),
        output: String::from_utf8_lossy(&output.stdout).into_owned(),
        error: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
