// Route groups mounted on the HTTP server.

use axum::Router;

/// A group of routes mounted on the [`HttpServer`](crate::http::HttpServer).
pub trait Controller: Send + Sync {
    /// Short name used when logging mounted routes.
    fn name(&self) -> &str;

    /// Mounts this controller's routes on `router`.
    fn add_route(&self, router: Router) -> Router;
}
