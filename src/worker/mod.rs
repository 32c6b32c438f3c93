//! Worker module for polling and running queued jobs
//!
//! This module provides:
//! - Worker: Main loop that polls the job manager for its name
//! - WorkerConfig: Configuration for the worker
//! - ShutdownSignal: Flag flipped by the SIGTERM handler

pub mod config;
pub mod runner;
pub mod signal;

pub use config::{JobFailurePolicy, WorkerConfig, WorkerConfigBuilder};
pub use runner::{Worker, WorkerState, WorkerStats};
pub use signal::{install_shutdown_handler, ShutdownSignal};
