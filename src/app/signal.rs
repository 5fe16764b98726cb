// OS signal subscription feeding the shutdown trigger.

use serde::{Deserialize, Serialize};
use std::io;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::shutdown::{ShutdownReason, Trigger};

/// Termination signals the app can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Interrupt,
    Terminate,
    Hangup,
    Quit,
}

impl Signal {
    pub const DEFAULT: [Signal; 2] = [Signal::Interrupt, Signal::Terminate];

    pub const fn name(&self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Hangup => "SIGHUP",
            Signal::Quit => "SIGQUIT",
        }
    }

    #[cfg(unix)]
    fn kind(&self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;
        match self {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::Quit => SignalKind::quit(),
        }
    }
}

/// Subscribes to `signals` and fires `trigger` on the first one received.
///
/// Every subscription is registered before this returns, so a signal sent
/// right after cannot be missed. The listeners exit, dropping their
/// subscriptions, as soon as the trigger fires for any reason.
#[cfg(unix)]
pub(crate) fn subscribe(signals: &[Signal], trigger: Trigger) -> io::Result<Vec<JoinHandle<()>>> {
    let mut streams = Vec::with_capacity(signals.len());
    for sig in dedup(signals) {
        streams.push((sig, tokio::signal::unix::signal(sig.kind())?));
    }

    let handles = streams
        .into_iter()
        .map(|(sig, mut stream)| {
            let trigger = trigger.clone();
            tokio::task::spawn(async move {
                tokio::select! {
                    received = stream.recv() => {
                        if received.is_some() {
                            info!(
                                component = "app",
                                scope = "signal",
                                event = "os_signal",
                                signal = sig.name(),
                                "signal caught"
                            );
                            trigger.fire(ShutdownReason::Signal(sig.name().to_string()));
                        }
                    }
                    _ = trigger.fired() => {}
                }
            })
        })
        .collect();

    Ok(handles)
}

/// Only Ctrl+C is available off unix; other signals are ignored.
#[cfg(not(unix))]
pub(crate) fn subscribe(signals: &[Signal], trigger: Trigger) -> io::Result<Vec<JoinHandle<()>>> {
    let mut handles = Vec::new();
    for sig in dedup(signals) {
        if sig != Signal::Interrupt {
            warn!(
                component = "app",
                scope = "signal",
                event = "unsupported_signal",
                signal = sig.name(),
                "signal is not supported on this platform"
            );
            continue;
        }
        let trigger = trigger.clone();
        handles.push(tokio::task::spawn(async move {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    if res.is_ok() {
                        info!(
                            component = "app",
                            scope = "signal",
                            event = "os_signal",
                            signal = sig.name(),
                            "signal caught"
                        );
                        trigger.fire(ShutdownReason::Signal(sig.name().to_string()));
                    }
                }
                _ = trigger.fired() => {}
            }
        }));
    }
    Ok(handles)
}

fn dedup(signals: &[Signal]) -> Vec<Signal> {
    let mut out: Vec<Signal> = Vec::with_capacity(signals.len());
    for sig in signals {
        if !out.contains(sig) {
            out.push(*sig);
        }
    }
    if out.is_empty() {
        warn!(
            component = "app",
            scope = "signal",
            event = "no_signals",
            "no termination signals configured, shutdown only on request or cancellation"
        );
    }
    out
}
