// Package watchdog keeps an eye on an external dependency and reports its health.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::component::Component;
use crate::config;
use crate::health::{AtomicStatus, HealthChecker, Status};
use crate::shutdown::Deadline;


/// Connection to a dependency that can be checked and released.
#[async_trait::async_trait]
pub trait Ping: Send + Sync + 'static {
    async fn ping(&self) -> Result<()>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Checks that a TCP endpoint accepts connections.
#[derive(Debug, Clone)]
pub struct TcpPing {
    addr: String,
}

impl TcpPing {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn from_socket(addr: SocketAddr) -> Self {
        Self::new(addr.to_string())
    }
}

#[async_trait::async_trait]
impl Ping for TcpPing {
    async fn ping(&self) -> Result<()> {
        TcpStream::connect(&self.addr)
            .await
            .with_context(|| format!("unable to connect to {}", self.addr))?;
        Ok(())
    }
}

/// Component that pings a dependency on an interval and exposes the result
/// as its health status.
///
/// The first ping happens in `init`, so an unreachable dependency aborts start-up.
pub struct Watchdog<P: Ping> {
    name: String,
    ping: P,
    interval: Duration,
    timeout: Duration,
    status: AtomicStatus,
}

impl<P: Ping> Watchdog<P> {
    pub fn new(name: impl Into<String>, ping: P, interval: Duration, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            ping,
            interval,
            timeout,
            status: AtomicStatus::new(Status::Up),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    async fn check(&self) -> Result<()> {
        match tokio::time::timeout(self.timeout, self.ping.ping()).await {
            Ok(res) => res,
            Err(_) => Err(anyhow::anyhow!("ping timed out after {:?}", self.timeout)),
        }
    }

    fn set_status(&self, next: Status, err: Option<&anyhow::Error>) {
        let prev = self.status.swap(next);
        if prev == next {
            return;
        }
        match err {
            Some(err) => warn!(
                component = "watchdog",
                event = "status_changed",
                name = %self.name,
                from = prev.as_str(),
                to = next.as_str(),
                error = %format!("{err:#}"),
                "dependency status changed"
            ),
            None => info!(
                component = "watchdog",
                event = "status_changed",
                name = %self.name,
                from = prev.as_str(),
                to = next.as_str(),
                "dependency status changed"
            ),
        }
    }
}

impl Watchdog<TcpPing> {
    /// Builds a TCP watchdog from its config entry.
    pub fn from_config(cfg: &config::Watchdog) -> Self {
        Self::new(
            cfg.name.clone(),
            TcpPing::new(cfg.addr.clone()),
            cfg.interval(),
            cfg.timeout(),
        )
    }
}

#[async_trait::async_trait]
impl<P: Ping> Component for Watchdog<P> {
    async fn init(&self) -> Result<()> {
        self.check()
            .await
            .with_context(|| format!("{} is not reachable", self.name))?;
        debug!(component = "watchdog", event = "init_success", name = %self.name, "dependency reachable");
        Ok(())
    }

    async fn run(&self, token: CancellationToken) -> Result<()> {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // init already checked, skip the immediate tick
        interval.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    return Ok(());
                }
                _ = interval.tick() => {
                    // an in-flight ping must not delay cancellation
                    let res = tokio::select! {
                        _ = token.cancelled() => return Ok(()),
                        res = self.check() => res,
                    };
                    match res {
                        Ok(()) => self.set_status(Status::Up, None),
                        Err(err) => self.set_status(Status::Down, Some(&err)),
                    }
                }
            }
        }
    }

    async fn stop(&self, _deadline: Deadline) -> Result<()> {
        self.ping
            .close()
            .await
            .with_context(|| format!("unable to close {}", self.name))
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn as_health_checker(self: Arc<Self>) -> Option<Arc<dyn HealthChecker>> {
        Some(self)
    }
}

impl<P: Ping> HealthChecker for Watchdog<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> Status {
        self.status.load()
    }
}
