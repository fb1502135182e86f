//! Cancellation on SIGTERM and SIGINT.
//!
//! [`SigDown`] turns the first shutdown signal into a cancelled
//! [`CancellationToken`], so a running poll loop stops before its next request.
//!
//! # Example
//!
//! ```ignore
//! use payintent::util::SigDown;
//!
//! let sig_down = SigDown::try_new()?;
//! let payment = client
//!     .poll_payment(&id, &options, &sig_down.cancellation_token())
//!     .await?;
//! ```

use tokio::signal::unix::SignalKind;
use tokio::signal::unix::signal;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Cancels a token on the first SIGTERM or SIGINT.
pub struct SigDown {
    task_tracker: TaskTracker,
    cancellation_token: CancellationToken,
}

impl SigDown {
    /// Registers the signal handlers.
    ///
    /// Returns an error if signal registration fails.
    pub fn try_new() -> Result<Self, std::io::Error> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let inner = CancellationToken::new();
        let outer = inner.clone();
        let task_tracker = TaskTracker::new();
        task_tracker.spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::warn!("SIGTERM received, aborting");
                },
                _ = sigint.recv() => {
                    tracing::warn!("Interrupted, aborting");
                },
                _ = inner.cancelled() => {
                    return;
                }
            }
            inner.cancel();
        });
        task_tracker.close();
        Ok(Self {
            task_tracker,
            cancellation_token: outer,
        })
    }

    /// A token cancelled on the first shutdown signal.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Stops listening for signals and waits for the listener task to end.
    pub async fn close(self) {
        self.cancellation_token.cancel();
        self.task_tracker.wait().await;
    }
}
