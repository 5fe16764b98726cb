// Package component defines the lifecycle contract of background units managed by the app.

use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::health::HealthChecker;
use crate::shutdown::Deadline;

/// A background unit driven through `init`, `run` and `stop` by the app.
///
/// * `init` is awaited on the app's control path before anything runs. Keep
///   it short: it blocks the whole start-up, and an error aborts it.
/// * `run` is spawned once, concurrently with every other component and the
///   server. It must return soon after `token` is cancelled. An error is
///   logged; it neither restarts the component nor stops the process.
/// * `stop` is called once during shutdown, after `token` was cancelled, in
///   registration order. Every stop shares the same [`Deadline`] and the app
///   stops waiting once it passes.
///
/// A component that also reports health overrides [`Component::as_health_checker`]
/// and is picked up by the health calculator when it is registered.
#[async_trait::async_trait]
pub trait Component: Send + Sync + 'static {
    async fn init(&self) -> Result<()>;

    async fn run(&self, token: CancellationToken) -> Result<()>;

    async fn stop(&self, deadline: Deadline) -> Result<()>;

    /// Identity used in logs and init errors.
    fn label(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn as_health_checker(self: Arc<Self>) -> Option<Arc<dyn HealthChecker>> {
        None
    }
}
