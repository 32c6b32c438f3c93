//! Database models matching the jobs table

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// QueuedJob - Matches jobs table
#[derive(Debug, Clone, FromRow)]
pub struct QueuedJob {
    pub id: i32,
    pub name: Option<String>,
    pub command: String,
    pub priority: i32,
    pub state: String,
    pub runner: Option<String>,
    pub planified_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub result_code: Option<i32>,
    pub result_output: Option<String>,
    pub result_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Planned, not yet handed to a worker
    Waiting,
    /// Claimed by a worker, not started
    Instantiated,
    Started,
    Finished,
    Error,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Waiting => "waiting",
            JobState::Instantiated => "instantiated",
            JobState::Started => "started",
            JobState::Finished => "finished",
            JobState::Error => "error",
        }
    }
}

/// Input for enqueuing a job
#[derive(Debug, Clone)]
pub struct NewJob {
    pub name: Option<String>,
    pub command: String,
    /// Lower runs first
    pub priority: i32,
    /// Restrict the job to one worker; `None` lets any worker take it
    pub runner: Option<String>,
    pub planified_at: Option<DateTime<Utc>>,
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub code: i32,
    pub output: String,
    pub error: String,
}

impl JobResult {
    pub fn succeeded(&self) -> bool {
        self.code == 0
    }
}
