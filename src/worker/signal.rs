//! Shutdown flag and SIGTERM handling

use crate::error::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// One-way shutdown flag shared between the signal task and the run loop.
///
/// Once requested it stays requested.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Returns `true` only for the call that flipped the flag.
    pub fn request(&self) -> bool {
        !self.requested.swap(true, Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Install the graceful-termination handler.
///
/// The listener is registered before this returns, so a SIGTERM arriving
/// afterwards is never lost. The spawned task only flips the flag and logs.
#[cfg(unix)]
pub fn install_shutdown_handler(shutdown: ShutdownSignal) -> Result<()> {
    use crate::error::WorkerError;
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())
        .map_err(|e| WorkerError::SignalError(format!("SIGTERM: {}", e)))?;

    tokio::spawn(async move {
        while term.recv().await.is_some() {
            if shutdown.request() {
                info!("Caught TERM signal, terminating ...");
            } else {
                debug!("Caught TERM signal again, shutdown already in progress");
            }
        }
    });

    Ok(())
}

/// Install the graceful-termination handler (Ctrl+C on non-unix targets).
#[cfg(not(unix))]
pub fn install_shutdown_handler(shutdown: ShutdownSignal) -> Result<()> {
    tokio::spawn(async move {
        loop {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    if shutdown.request() {
                        info!("Received Ctrl+C, terminating ...");
                    } else {
                        debug!("Received Ctrl+C again, shutdown already in progress");
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to listen for Ctrl+C: {}", e);
                    break;
                }
            }
        }
    });

    Ok(())
}
