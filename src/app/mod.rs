// Package app provides the service orchestrator: registration, start-up and graceful shutdown.

mod app;
mod error;
mod server;
mod signal;
mod state;


pub use app::{App, AppBuilder, DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT, DEFAULT_SETTLE_DELAY};
pub use error::AppError;
pub use server::Server;
pub use signal::Signal;
pub use state::State;
