//! Job Worker CLI
//!
//! Runs a named worker against the Postgres job queue until SIGTERM.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use job_worker::db::{create_pool_from_env, jobs, PgJobManager};
use job_worker::worker::{JobFailurePolicy, Worker, WorkerConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "job-worker")]
#[command(about = "Poll a job queue and run the jobs assigned to a named worker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as worker until SIGTERM
    Run {
        /// Worker name; only jobs unassigned or assigned to this name are taken
        #[arg(short, long, env = "WORKER_NAME")]
        name: String,

        /// Seconds to wait before polling again when idle (unset: poll immediately)
        #[arg(long, env = "WORKER_SLEEP_TIME")]
        sleep_time: Option<f64>,

        /// Seconds between shutdown checks while waiting
        #[arg(long, env = "WORKER_SLEEP_INTERVAL", default_value = "1")]
        sleep_interval: f64,

        /// What to do when a job fails: continue or propagate
        #[arg(long, env = "WORKER_ON_JOB_FAILURE", default_value = "continue")]
        on_job_failure: JobFailurePolicy,

        /// Seconds to back off after the job queue itself fails
        #[arg(long, env = "WORKER_MANAGER_BACKOFF", default_value = "10")]
        manager_backoff: f64,

        /// Run at most one job and exit (for testing)
        #[arg(long)]
        once: bool,
    },

    /// Print the number of waiting jobs
    Pending,
}

fn seconds(flag: &str, value: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(value) {
        Ok(duration) => Ok(duration),
        Err(_) => bail!("--{} must be a non-negative number of seconds, got {}", flag, value),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            name,
            sleep_time,
            sleep_interval,
            on_job_failure,
            manager_backoff,
            once,
        } => {
            info!("Initializing worker...");

            let mut builder = WorkerConfig::builder()
                .poll_granularity(seconds("sleep-interval", sleep_interval)?)
                .manager_error_backoff(seconds("manager-backoff", manager_backoff)?)
                .failure_policy(on_job_failure);
            if let Some(sleep_time) = sleep_time {
                builder = builder.poll_interval_max(seconds("sleep-time", sleep_time)?);
            }
            let config = builder.build();

            let pool = create_pool_from_env().await?;
            info!("Database connection established");

            let worker = Worker::new(name, config, Arc::new(PgJobManager::new(pool)))?;

            if once {
                match worker.run_once().await? {
                    true => println!("Job processed"),
                    false => println!("No job available"),
                }
            } else {
                worker.run().await?;
            }
        }

        Commands::Pending => {
            let pool = create_pool_from_env().await?;
            let count = jobs::count_pending_jobs(&pool).await?;
            println!("{}", count);
        }
    }

    Ok(())
}
