pub mod app;
pub mod component;
pub mod config;
pub mod controller;
pub mod health;
pub mod http;
pub mod logger;
pub mod shutdown;
pub mod watchdog;

#[cfg(test)]
mod tests;

pub use app::{App, AppBuilder, AppError, Server, Signal, State};
pub use component::Component;
pub use health::{HealthCalculator, HealthChecker, Status};
