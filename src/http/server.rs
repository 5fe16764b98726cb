//! HTTP server implementation.
//

use anyhow::{Context, Result};
use axum::Router;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::app::Server;
use crate::config;
use crate::shutdown::{Deadline, DeadlineExceeded};

use super::Controller;

/// axum-based server driven by the app lifecycle.
pub struct HttpServer {
    addr: SocketAddr,
    router: Router,
    shutdown_token: CancellationToken,
    finished: CancellationToken,
    started: AtomicBool,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl HttpServer {
    /// Creates a new HTTP server serving the routes of `controllers`.
    pub fn new(cfg: &config::Server, controllers: Vec<Box<dyn Controller>>) -> Result<Arc<Self>> {
        cfg.validate()?;
        let addr = cfg.socket_addr()?;
        let router = Self::build_router(controllers, cfg.request_timeout());

        Ok(Arc::new(Self {
            addr,
            router,
            shutdown_token: CancellationToken::new(),
            finished: CancellationToken::new(),
            started: AtomicBool::new(false),
            local_addr: Mutex::new(None),
        }))
    }

    /// Address actually bound, known once serving started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Builds the router with all controllers.
    fn build_router(controllers: Vec<Box<dyn Controller>>, timeout: Duration) -> Router {
        let mut router = Router::new();

        for controller in controllers {
            debug!(
                component = "server",
                event = "controller_mounted",
                controller = controller.name(),
                "controller mounted"
            );
            router = controller.add_route(router);
        }

        router
            .layer(TimeoutLayer::new(timeout))
            .layer(TraceLayer::new_for_http())
    }

    async fn serve(&self) -> Result<()> {
        if self.shutdown_token.is_cancelled() {
            return Ok(());
        }

        let listener = TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("failed to bind TCP listener on {}", self.addr))?;
        let local_addr = listener.local_addr().context("failed to read bound address")?;
        *self.local_addr.lock() = Some(local_addr);

        info!(
            component = "server",
            event = "started",
            addr = %local_addr,
            "server started"
        );

        let shutdown_token = self.shutdown_token.clone();
        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
            })
            .await
            .map_err(|e| {
                error!(
                    component = "server",
                    event = "listen_and_serve_failed",
                    addr = %local_addr,
                    error = %e,
                    "server failed to listen and serve"
                );
                anyhow::Error::from(e)
            })?;

        info!(
            component = "server",
            event = "stopped",
            addr = %local_addr,
            "server stopped"
        );

        Ok(())
    }
}

#[async_trait::async_trait]
impl Server for HttpServer {
    async fn listen_and_serve(&self) -> Result<()> {
        self.started.store(true, Ordering::Release);
        let result = self.serve().await;
        self.finished.cancel();
        result
    }

    /// Stops accepting connections and waits for in-flight requests to drain.
    async fn shutdown(&self, deadline: Deadline) -> Result<()> {
        self.shutdown_token.cancel();
        if !self.started.load(Ordering::Acquire) {
            return Ok(());
        }

        tokio::select! {
            _ = self.finished.cancelled() => Ok(()),
            _ = deadline.expired() => Err(DeadlineExceeded.into()),
        }
    }
}
