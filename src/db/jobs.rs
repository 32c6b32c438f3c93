//! Jobs table operations

use crate::db::models::{JobResult, JobState, NewJob, QueuedJob};
use crate::db::DbPool;
use crate::error::Result;
use sqlx::Row;

/// Atomically claim the next runnable job for `runner` and return it.
///
/// A job is runnable when it is waiting, its planned time has passed and it
/// is either unassigned or assigned to this runner. Lower priority values
/// go first, then older planned times. Safe for concurrent workers.
pub async fn claim_next_job(pool: &DbPool, runner: &str) -> Result<Option<QueuedJob>> {
    let job = sqlx::query_as::<_, QueuedJob>(
        r#"
        WITH next_job AS (
            SELECT id FROM jobs
            WHERE state = 'waiting'
              AND planified_at <= NOW()
              AND (runner IS NULL OR runner = $1)
            ORDER BY priority ASC, planified_at ASC, id ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
        )
        UPDATE jobs
        SET state = 'instantiated',
            runner = $1,
            updated_at = NOW()
        WHERE id = (SELECT id FROM next_job)
        RETURNING *
        "#,
    )
    .bind(runner)
    .fetch_optional(pool)
    .await?;

    Ok(job)
}

/// Mark a claimed job as started
pub async fn start_job(pool: &DbPool, job_id: i32) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE jobs
        SET state = 'started',
            started_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Hand a claimed but unstarted job back to the queue
///
/// The runner assignment is kept, so the same worker picks it up again.
pub async fn release_job(pool: &DbPool, job_id: i32) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE jobs
        SET state = 'waiting',
            updated_at = NOW()
        WHERE id = $1
          AND state = 'instantiated'
        "#,
    )
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Store a command result and move the job to its final state
pub async fn finish_job(pool: &DbPool, job_id: i32, result: &JobResult) -> Result<()> {
    let state = if result.succeeded() {
        JobState::Finished
    } else {
        JobState::Error
    };

    sqlx::query(
        r#"
        UPDATE jobs
        SET state = $2,
            result_code = $3,
            result_output = $4,
            result_error = $5,
            ended_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .bind(state.as_str())
    .bind(result.code)
    .bind(&result.output)
    .bind(&result.error)
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark a job as errored without a command result (e.g. it could not be spawned)
pub async fn error_job(pool: &DbPool, job_id: i32, error_msg: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE jobs
        SET state = 'error',
            result_error = $2,
            ended_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(job_id)
    .bind(error_msg)
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert a waiting job and return its id
pub async fn enqueue_job(pool: &DbPool, job: &NewJob) -> Result<i32> {
    let id = sqlx::query_scalar::<_, i32>(
        r#"
        INSERT INTO jobs (name, command, priority, runner, state, planified_at)
        VALUES ($1, $2, $3, $4, 'waiting', COALESCE($5, NOW()))
        RETURNING id
        "#,
    )
    .bind(&job.name)
    .bind(&job.command)
    .bind(job.priority)
    .bind(&job.runner)
    .bind(job.planified_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Count waiting jobs for monitoring
pub async fn count_pending_jobs(pool: &DbPool) -> Result<i64> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) as count FROM jobs
        WHERE state = 'waiting'
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(row.get("count"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool_from_env;

    #[tokio::test]
    #[ignore] // Requires database with the jobs table
    async fn test_claim_respects_runner_assignment() {
        dotenvy::dotenv().ok();
        let pool = create_pool_from_env().await.unwrap();

        let id = enqueue_job(
            &pool,
            &NewJob {
                name: Some("claim test".to_string()),
                command: "true".to_string(),
                priority: -1000,
                runner: Some("claim-test-a".to_string()),
                planified_at: None,
            },
        )
        .await
        .unwrap();

        let other = claim_next_job(&pool, "claim-test-b").await.unwrap();
        assert!(other.map(|j| j.id != id).unwrap_or(true));

        let claimed = claim_next_job(&pool, "claim-test-a").await.unwrap().unwrap();
        assert_eq!(claimed.id, id);
        assert_eq!(claimed.state, JobState::Instantiated.as_str());
        assert_eq!(claimed.runner.as_deref(), Some("claim-test-a"));
    }
}
