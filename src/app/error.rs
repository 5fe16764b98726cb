// Error definitions for the app lifecycle

use super::State;

/// Errors surfaced by [`App`](super::App).
///
/// Only start-up failures are returned from `start`; run, serve and stop
/// failures are logged.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("unable to init component {component}: {source}")]
    Init {
        component: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("app cannot be started twice (current state: {0})")]
    AlreadyStarted(State),

    #[error("unable to subscribe to OS signals: {0}")]
    Signal(#[from] std::io::Error),

    #[error("unable to build the HTTP server: {0:#}")]
    HttpServer(#[source] anyhow::Error),

    #[error("unable to encode the health summary: {0}")]
    Encode(#[from] serde_json::Error),
}
