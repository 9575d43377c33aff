//! Shutdown signal handling
//!
//! Ctrl+C (and SIGTERM on unix) end a recording or playback cleanly instead
//! of killing the process with a half-written file.

use tokio::sync::watch;
use tracing::debug;

/// Shutdown signal shared by the long-running commands
pub struct ShutdownSignal {
    shutdown: watch::Sender<bool>,
}

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self { shutdown }
    }

    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Request shutdown
    pub fn trigger(&self) {
        self.shutdown.send_replace(true);
    }

    /// Resolve once shutdown has been requested
    pub async fn wait(&self) {
        let mut rx = self.shutdown.subscribe();
        let _ = rx.wait_for(|&requested| requested).await;
    }

    /// Setup signal handlers
    pub fn setup(&self) -> Result<(), std::io::Error> {
        let tx = self.shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("received Ctrl+C");
                tx.send_replace(true);
            }
        });

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let tx = self.shutdown.clone();
            let mut sigterm = signal(SignalKind::terminate())?;
            tokio::spawn(async move {
                sigterm.recv().await;
                debug!("received SIGTERM");
                tx.send_replace(true);
            });
        }

        Ok(())
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
