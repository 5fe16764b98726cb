// Main entrypoint for the svckit service.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use svckit::app::App;
use svckit::config::{env, Config};
use svckit::logger;
use svckit::watchdog::Watchdog;

const CONFIG_PATH: &str = "cfg/svckit.cfg.yaml";
const CONFIG_PATH_ENV: &str = "SVCKIT_CONFIG";

/// svckit - service lifecycle runner with health reporting
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, value_name = "FILE")]
    cfg: Option<PathBuf>,
}

/// Loads the config from `path`, or from `SVCKIT_CONFIG` / the default location.
/// Built-in defaults are used when that file does not exist.
fn load_cfg(path: Option<PathBuf>) -> Result<Config> {
    let mut cfg = match path {
        Some(path) => Config::load(&path)
            .with_context(|| format!("failed to load custom config from {:?}", path))?,
        None => {
            let path = PathBuf::from(env::get_or(CONFIG_PATH_ENV, CONFIG_PATH));
            if path.exists() {
                Config::load(&path)?
            } else {
                Config::default()
            }
        }
    };
    cfg.apply_env()?;
    Ok(cfg)
}

fn build_app(cfg: &Config) -> Result<Arc<App>> {
    let app = App::builder()
        .graceful_shutdown_timeout(cfg.shutdown_timeout())
        .settle_delay(cfg.settle_delay())
        .signals(cfg.signals())
        .build();

    for watchdog in cfg.watchdogs() {
        app.add_component(Arc::new(Watchdog::from_config(watchdog)));
    }
    if let Some(server) = cfg.server() {
        app.set_http_server(server, Vec::new())?;
    }

    Ok(Arc::new(app))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = load_cfg(args.cfg)?;
    logger::configure(&cfg)?;

    info!(
        component = "main",
        event = "config_loaded",
        service = cfg.service_name(),
        env = %cfg.app.env,
        watchdogs = cfg.watchdogs().len(),
        "config loaded"
    );

    tokio::runtime::Runtime::new()
        .context("Failed to create tokio runtime")?
        .block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<()> {
    let app = build_app(&cfg)?;

    if let Err(e) = app.start(CancellationToken::new()).await {
        error!(
            component = "main",
            scope = "app",
            event = "start_failed",
            service = cfg.service_name(),
            error = %e,
            "failed to start app"
        );
        return Err(e.into());
    }

    info!(
        component = "main",
        event = "exited",
        service = cfg.service_name(),
        reason = %app.shutdown_reason().map(|r| r.to_string()).unwrap_or_default(),
        "service exited"
    );
    Ok(())
}
