// Instrumented component used by lifecycle scenarios.

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::Journal;
use crate::component::Component;
use crate::health::{HealthChecker, Status};
use crate::shutdown::Deadline;

pub struct FakeComponent {
    name: String,
    journal: Journal,
    init_err: Option<String>,
    run_err: Option<String>,
    stop_err: Option<String>,
    stop_delay: Duration,
    health: Option<Status>,
    pub init_calls: AtomicUsize,
    pub run_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
    pub saw_cancellation: AtomicBool,
}

impl FakeComponent {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            init_err: None,
            run_err: None,
            stop_err: None,
            stop_delay: Duration::ZERO,
            health: None,
            init_calls: AtomicUsize::new(0),
            run_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            saw_cancellation: AtomicBool::new(false),
        }
    }

    pub fn failing_init(mut self, msg: &str) -> Self {
        self.init_err = Some(msg.to_string());
        self
    }

    pub fn failing_run(mut self, msg: &str) -> Self {
        self.run_err = Some(msg.to_string());
        self
    }

    pub fn failing_stop(mut self, msg: &str) -> Self {
        self.stop_err = Some(msg.to_string());
        self
    }

    pub fn slow_stop(mut self, delay: Duration) -> Self {
        self.stop_delay = delay;
        self
    }

    /// Makes the component report health with a fixed status.
    pub fn reporting(mut self, status: Status) -> Self {
        self.health = Some(status);
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.init_calls.load(Ordering::SeqCst),
            self.run_calls.load(Ordering::SeqCst),
            self.stop_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait::async_trait]
impl Component for FakeComponent {
    async fn init(&self) -> Result<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.push(format!("init:{}", self.name));
        match &self.init_err {
            Some(msg) => Err(anyhow!("{msg}")),
            None => Ok(()),
        }
    }

    async fn run(&self, token: CancellationToken) -> Result<()> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.push(format!("run:{}", self.name));
        if let Some(msg) = &self.run_err {
            return Err(anyhow!("{msg}"));
        }

        token.cancelled().await;
        self.saw_cancellation.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self, _deadline: Deadline) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.push(format!("stop:{}", self.name));
        if !self.stop_delay.is_zero() {
            tokio::time::sleep(self.stop_delay).await;
        }
        match &self.stop_err {
            Some(msg) => Err(anyhow!("{msg}")),
            None => Ok(()),
        }
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn as_health_checker(self: Arc<Self>) -> Option<Arc<dyn HealthChecker>> {
        if self.health.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl HealthChecker for FakeComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> Status {
        self.health.unwrap_or(Status::Up)
    }
}
