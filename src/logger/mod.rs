// Package logger configures the process-wide tracing subscriber.

use anyhow::{anyhow, Result};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Installs the global subscriber: JSON in prod, pretty console output otherwise.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn configure(cfg: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(cfg.log_level()))
        .map_err(|err| anyhow!("invalid log level {:?}: {err}", cfg.log_level()))?;

    let res = if cfg.is_prod() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .try_init()
    };

    res.map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
