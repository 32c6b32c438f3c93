//! Error types for job-worker

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Job {job_id} failed: {message}")]
    JobExecutionFailure { job_id: String, message: String },

    #[error("Job manager unavailable: {0}")]
    ManagerUnavailable(String),

    #[error("Failed to install signal handler: {0}")]
    SignalError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("File system error")]
    FsError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WorkerError>;
