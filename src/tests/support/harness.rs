// Helpers to drive an app from a test.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::app::{App, AppError, State};

/// Upper bound for any single scenario.
pub const SCENARIO_TIMEOUT: Duration = Duration::from_secs(5);

/// Starts `app` on its own task.
pub fn spawn_app(app: &Arc<App>, ctx: CancellationToken) -> JoinHandle<Result<(), AppError>> {
    let app = app.clone();
    tokio::spawn(async move { app.start(ctx).await })
}

/// Polls until the app reaches `state`. Panics after [`SCENARIO_TIMEOUT`].
pub async fn wait_for_state(app: &App, state: State) {
    tokio::time::timeout(SCENARIO_TIMEOUT, async {
        while app.state() != state {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("app never reached {state}, stuck in {}", app.state()));
}

/// Awaits the start task. Panics if it does not return within [`SCENARIO_TIMEOUT`].
pub async fn join_app(handle: JoinHandle<Result<(), AppError>>) -> Result<(), AppError> {
    tokio::time::timeout(SCENARIO_TIMEOUT, handle)
        .await
        .expect("start did not return in time")
        .expect("start task panicked")
}
