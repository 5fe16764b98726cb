// Configuration loading and management.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::app::{Signal, DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT, DEFAULT_SETTLE_DELAY};

pub mod env;
#[cfg(test)]
mod test_config;

#[cfg(test)]
pub use test_config::new_test_config;

pub const PROD: &str = "prod";
pub const DEV: &str = "dev";
pub const TEST: &str = "test";

pub const DEFAULT_SERVICE_NAME: &str = "service";
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const DEFAULT_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5042;
pub const DEFAULT_HEALTH_PATH: &str = "/healthcheck";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(rename = "app")]
    pub app: AppBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppBox {
    pub env: String,
    pub name: Option<String>,
    pub logs: Option<Logs>,
    pub shutdown: Option<Shutdown>,
    pub server: Option<Server>,
    #[serde(default)]
    pub watchdogs: Vec<Watchdog>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Shutdown {
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    #[serde(rename = "settle_delay", default, with = "humantime_serde")]
    pub settle_delay: Option<Duration>,
    pub signals: Option<Vec<Signal>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Server {
    pub addr: Option<String>,
    pub port: Option<u16>,
    #[serde(rename = "request_timeout", default, with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    #[serde(rename = "health_path")]
    pub health_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Watchdog {
    pub name: String,
    pub addr: String,
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Server {
    /// Address the HTTP server binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = self.addr.as_deref().unwrap_or(DEFAULT_ADDR);
        let port = self.port.unwrap_or(DEFAULT_PORT);
        format!("{addr}:{port}")
            .parse()
            .with_context(|| format!("invalid server address {addr}:{port}"))
    }

    /// Rejects values the router cannot mount.
    pub fn validate(&self) -> Result<()> {
        let path = self.health_path();
        if !path.starts_with('/') {
            bail!("health_path {path:?} must start with '/'");
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn health_path(&self) -> &str {
        self.health_path.as_deref().unwrap_or(DEFAULT_HEALTH_PATH)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }
}

impl Watchdog {
    pub fn interval(&self) -> Duration {
        self.interval.unwrap_or(DEFAULT_WATCHDOG_INTERVAL)
    }

    /// Per-check timeout, defaults to the interval.
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or_else(|| self.interval())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppBox {
                env: DEV.to_string(),
                name: None,
                logs: None,
                shutdown: None,
                server: Some(Server::default()),
                watchdogs: Vec::new(),
            },
        }
    }
}

impl Config {
    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        Self::parse(&raw).with_context(|| format!("failed to parse config file {:?}", path))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(raw)?;
        if let Some(server) = cfg.server() {
            server.validate()?;
        }
        Ok(cfg)
    }

    /// Applies `SERVICE_NAME`, `SERVICE_ADDR`, `SERVICE_PORT` and `LOG_LEVEL`.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| env::get_required(key).ok())
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(name) = lookup("SERVICE_NAME") {
            self.app.name = Some(name);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.app.logs.get_or_insert_with(Logs::default).level = Some(level.to_lowercase());
        }

        let addr = lookup("SERVICE_ADDR");
        let port = lookup("SERVICE_PORT");
        if addr.is_some() || port.is_some() {
            let server = self.app.server.get_or_insert_with(Server::default);
            if let Some(addr) = addr {
                server.addr = Some(addr);
            }
            if let Some(port) = port {
                server.port = Some(
                    port.parse()
                        .with_context(|| format!("SERVICE_PORT={port} is not a valid port"))?,
                );
            }
        }
        Ok(())
    }

    pub fn is_prod(&self) -> bool {
        self.app.env == PROD
    }

    pub fn service_name(&self) -> &str {
        self.app.name.as_deref().unwrap_or(DEFAULT_SERVICE_NAME)
    }

    pub fn log_level(&self) -> &str {
        self.app
            .logs
            .as_ref()
            .and_then(|logs| logs.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.app
            .shutdown
            .as_ref()
            .and_then(|s| s.timeout)
            .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT)
    }

    pub fn settle_delay(&self) -> Duration {
        self.app
            .shutdown
            .as_ref()
            .and_then(|s| s.settle_delay)
            .unwrap_or(DEFAULT_SETTLE_DELAY)
    }

    pub fn signals(&self) -> Vec<Signal> {
        self.app
            .shutdown
            .as_ref()
            .and_then(|s| s.signals.clone())
            .unwrap_or_else(|| Signal::DEFAULT.to_vec())
    }

    /// HTTP server settings, `None` disables the server.
    pub fn server(&self) -> Option<&Server> {
        self.app.server.as_ref()
    }

    pub fn watchdogs(&self) -> &[Watchdog] {
        &self.app.watchdogs
    }
}
