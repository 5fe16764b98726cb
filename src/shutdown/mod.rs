// Package shutdown provides the one-time shutdown trigger and the shared stop deadline.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;


#[derive(Debug, thiserror::Error)]
#[error("graceful shutdown deadline exceeded")]
pub struct DeadlineExceeded;

/// What started the shutdown sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// An OS signal was caught, holds its name (e.g. `SIGTERM`).
    Signal(String),
    /// The server's serve loop returned an error.
    ServerFailure(String),
    /// The caller's token was cancelled.
    Cancelled,
    /// Requested through a [`Trigger`] handle.
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal(sig) => write!(f, "signal {sig}"),
            ShutdownReason::ServerFailure(err) => write!(f, "server failure: {err}"),
            ShutdownReason::Cancelled => f.write_str("context cancelled"),
            ShutdownReason::Requested => f.write_str("requested"),
        }
    }
}

/// Single-fire shutdown latch.
///
/// The first call to [`Trigger::fire`] records its reason and wakes every
/// waiter; later calls are ignored. Clones share the same latch.
#[derive(Clone, Default)]
pub struct Trigger {
    token: CancellationToken,
    reason: Arc<Mutex<Option<ShutdownReason>>>,
}

impl Trigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the trigger. Returns false if it had already fired.
    pub fn fire(&self, reason: ShutdownReason) -> bool {
        {
            let mut slot = self.reason.lock();
            if slot.is_some() {
                debug!(
                    component = "shutdown",
                    event = "trigger_ignored",
                    reason = %reason,
                    "shutdown already triggered"
                );
                return false;
            }
            *slot = Some(reason);
        }
        self.token.cancel();
        true
    }

    /// Requests a shutdown without an external cause.
    pub fn request(&self) -> bool {
        self.fire(ShutdownReason::Requested)
    }

    pub fn is_fired(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        self.reason.lock().clone()
    }

    /// Resolves once the trigger has fired and returns the winning reason.
    pub async fn fired(&self) -> ShutdownReason {
        self.token.cancelled().await;
        self.reason().unwrap_or(ShutdownReason::Requested)
    }
}

/// A fixed point in time by which shutdown work must be finished.
///
/// One deadline is shared by the server shutdown and every component stop.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    /// Time left, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Resolves when the deadline passes.
    pub async fn expired(&self) {
        tokio::time::sleep_until(self.at).await
    }

    /// Runs `fut` until it completes or the deadline passes.
    pub async fn run<F: std::future::Future>(&self, fut: F) -> Result<F::Output, DeadlineExceeded> {
        tokio::time::timeout_at(self.at, fut)
            .await
            .map_err(|_| DeadlineExceeded)
    }
}
