//! Job Worker - a daemon that runs queued jobs addressed to its name
//!
//! The worker polls a [`JobManager`] for the next job, runs it to completion,
//! and polls again. When nothing is available it waits in short slices so a
//! SIGTERM stops it within one slice instead of one full poll interval.
//!
//! # Example
//! ```ignore
//! use job_worker::db::{create_pool_from_env, PgJobManager};
//! use job_worker::worker::{Worker, WorkerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> job_worker::Result<()> {
//!     let pool = create_pool_from_env().await?;
//!     let config = WorkerConfig::builder().poll_interval_max_secs(5).build();
//!     let worker = Worker::new("mailer", config, Arc::new(PgJobManager::new(pool)))?;
//!     worker.run().await?;
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod manager;
pub mod worker;

pub use error::{Result, WorkerError};
pub use manager::{Job, JobManager};
pub use worker::{JobFailurePolicy, ShutdownSignal, Worker, WorkerConfig, WorkerState, WorkerStats};
