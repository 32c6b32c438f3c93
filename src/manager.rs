//! Consumer-side contract with the job queue manager
//!
//! The worker never owns job storage or job logic. It only asks a
//! [`JobManager`] for the next job addressed to its name and awaits
//! [`Job::run`] on whatever comes back.

use crate::error::Result;
use async_trait::async_trait;

/// A unit of work handed out by a [`JobManager`].
#[async_trait]
pub trait Job: Send {
    /// Identifier used in log lines and error reports.
    fn id(&self) -> String;

    /// Execute the job. The worker awaits this to completion and never
    /// cancels it, however long it takes.
    async fn run(&mut self) -> Result<()>;
}

/// Source of runnable jobs for a named worker.
#[async_trait]
pub trait JobManager: Send + Sync {
    /// Return the next job for `worker_name`, or `None` if nothing is runnable.
    ///
    /// Must return promptly whether or not work exists; waiting between
    /// polls is the worker's job.
    async fn fetch_next(&self, worker_name: &str) -> Result<Option<Box<dyn Job>>>;
}
