// Package controller provides the aggregate health check endpoint.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::error;

use crate::health::{report, HealthCalculator};
use crate::http::Controller;

/// Serves the health summary: 200 when healthy, 503 when any check is down.
#[derive(Clone)]
pub struct HealthController {
    path: String,
    calculator: Option<Arc<dyn HealthCalculator>>,
}

impl HealthController {
    pub fn new(path: impl Into<String>, calculator: Option<Arc<dyn HealthCalculator>>) -> Self {
        Self {
            path: path.into(),
            calculator,
        }
    }

    async fn health(&self) -> Response {
        match report(self.calculator.as_deref()) {
            Ok((healthy, body)) => {
                let status = if healthy {
                    StatusCode::OK
                } else {
                    StatusCode::SERVICE_UNAVAILABLE
                };
                (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
            }
            Err(e) => {
                error!(
                    component = "health",
                    event = "encode_failed",
                    error = %e,
                    "unable to encode the health summary"
                );
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl Controller for HealthController {
    fn name(&self) -> &str {
        "health"
    }

    fn add_route(&self, router: Router) -> Router {
        let controller = self.clone();
        router.route(
            &self.path,
            get(move || {
                let controller = controller.clone();
                async move { controller.health().await }
            }),
        )
    }
}
