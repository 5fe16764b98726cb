use super::{AppBox, Config, Logs, Server, Shutdown};
use crate::app::Signal;
use std::time::Duration;

/// Creates a new test configuration.
pub fn new_test_config() -> Config {
    Config {
        app: AppBox {
            env: super::TEST.to_string(),
            name: Some("svckit-test".to_string()),
            logs: Some(Logs {
                level: Some("debug".to_string()),
            }),
            shutdown: Some(Shutdown {
                timeout: Some(Duration::from_secs(2)),
                settle_delay: Some(Duration::ZERO),
                signals: Some(vec![Signal::Interrupt, Signal::Terminate]),
            }),
            server: Some(Server {
                addr: Some("127.0.0.1".to_string()),
                port: Some(0),
                request_timeout: Some(Duration::from_secs(5)),
                health_path: Some("/healthcheck".to_string()),
            }),
            watchdogs: Vec::new(),
        },
    }
}
