// HTTP API controllers.

pub mod controller;
pub mod health;

pub use health::HealthController;
