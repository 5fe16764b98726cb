// HTTP module: axum server and the controller interface for its routes.

mod server;


pub use server::HttpServer;

// Common controller interface
pub use crate::controller::controller::Controller;
