// Instrumented server used by lifecycle scenarios.

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::Journal;
use crate::app::Server;
use crate::shutdown::Deadline;

pub struct FakeServer {
    journal: Journal,
    listen_err: Option<String>,
    hang_on_shutdown: bool,
    stopped: CancellationToken,
    pub listen_calls: AtomicUsize,
    pub shutdown_calls: AtomicUsize,
}

impl FakeServer {
    pub fn new(journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
            listen_err: None,
            hang_on_shutdown: false,
            stopped: CancellationToken::new(),
            listen_calls: AtomicUsize::new(0),
            shutdown_calls: AtomicUsize::new(0),
        })
    }

    /// A server whose `listen_and_serve` fails right away.
    pub fn failing(journal: &Journal, msg: &str) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
            listen_err: Some(msg.to_string()),
            hang_on_shutdown: false,
            stopped: CancellationToken::new(),
            listen_calls: AtomicUsize::new(0),
            shutdown_calls: AtomicUsize::new(0),
        })
    }

    /// A server whose `shutdown` never returns and never stops serving.
    pub fn hanging(journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            journal: journal.clone(),
            listen_err: None,
            hang_on_shutdown: true,
            stopped: CancellationToken::new(),
            listen_calls: AtomicUsize::new(0),
            shutdown_calls: AtomicUsize::new(0),
        })
    }

    pub fn counts(&self) -> (usize, usize) {
        (
            self.listen_calls.load(Ordering::SeqCst),
            self.shutdown_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait::async_trait]
impl Server for FakeServer {
    async fn listen_and_serve(&self) -> Result<()> {
        self.listen_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.push("server:listen");
        if let Some(msg) = &self.listen_err {
            return Err(anyhow!("{msg}"));
        }
        self.stopped.cancelled().await;
        Ok(())
    }

    async fn shutdown(&self, _deadline: Deadline) -> Result<()> {
        self.shutdown_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.push("server:shutdown");
        if self.hang_on_shutdown {
            std::future::pending::<()>().await;
        }
        self.stopped.cancel();
        Ok(())
    }
}
