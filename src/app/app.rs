// Service application: owns components and the server, drives start-up and graceful shutdown.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::component::Component;
use crate::config;
use crate::controller::HealthController;
use crate::http::{Controller, HttpServer};
use crate::health::{report, Calculator, HealthCalculator, HealthChecker};
use crate::shutdown::{Deadline, ShutdownReason, Trigger};

use super::error::AppError;
use super::server::Server;
use super::signal::{self, Signal};
use super::State;

pub const DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Orchestrates the lifecycle of a single service process.
///
/// Register components and optionally a server, then call [`App::start`].
/// An `App` is single-use: once stopped it cannot be started again.
pub struct App {
    calculator: Option<Arc<dyn HealthCalculator>>,
    components: Mutex<Vec<Arc<dyn Component>>>,
    server: Mutex<Option<Arc<dyn Server>>>,
    graceful_timeout: Duration,
    settle_delay: Duration,
    signals: Vec<Signal>,
    state: Mutex<State>,
    trigger: Trigger,
}

/// Options for [`App`].
pub struct AppBuilder {
    calculator: Option<Arc<dyn HealthCalculator>>,
    server: Option<Arc<dyn Server>>,
    graceful_timeout: Duration,
    settle_delay: Duration,
    signals: Vec<Signal>,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self {
            calculator: Some(Arc::new(Calculator::new())),
            server: None,
            graceful_timeout: DEFAULT_GRACEFUL_SHUTDOWN_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            signals: Signal::DEFAULT.to_vec(),
        }
    }
}

impl AppBuilder {
    /// Budget shared by the server shutdown and all component stops.
    pub fn graceful_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.graceful_timeout = timeout;
        self
    }

    /// Pause between spawning the components and starting the server.
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.signals = signals.into_iter().collect();
        self
    }

    pub fn server(mut self, server: Arc<dyn Server>) -> Self {
        self.server = Some(server);
        self
    }

    pub fn health_calculator(mut self, calculator: Arc<dyn HealthCalculator>) -> Self {
        self.calculator = Some(calculator);
        self
    }

    /// Disables health aggregation; every health check reports healthy.
    pub fn without_health_calculator(mut self) -> Self {
        self.calculator = None;
        self
    }

    pub fn build(self) -> App {
        App {
            calculator: self.calculator,
            components: Mutex::new(Vec::new()),
            server: Mutex::new(self.server),
            graceful_timeout: self.graceful_timeout,
            settle_delay: self.settle_delay,
            signals: self.signals,
            state: Mutex::new(State::Idle),
            trigger: Trigger::new(),
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl App {
    /// Creates an app with default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> AppBuilder {
        AppBuilder::default()
    }

    /// Registers a component. If it also reports health it is added to the
    /// health calculator as well.
    ///
    /// Must be called before [`App::start`].
    pub fn add_component(&self, component: Arc<dyn Component>) {
        self.warn_if_started("add_component");

        if let Some(checker) = component.clone().as_health_checker() {
            self.add_health_check(checker);
        }
        debug!(
            component = "app",
            event = "component_registered",
            name = component.label(),
            "component registered"
        );
        self.components.lock().push(component);
    }

    /// Registers a health checker that is not a component.
    pub fn add_health_check(&self, checker: Arc<dyn HealthChecker>) {
        if let Some(calculator) = &self.calculator {
            calculator.add(checker);
        }
    }

    pub fn set_server(&self, server: Arc<dyn Server>) {
        self.warn_if_started("set_server");
        *self.server.lock() = Some(server);
    }

    /// Builds the default axum server from `cfg`, serving `controllers` plus
    /// the health route backed by this app's calculator, and sets it as the
    /// app server.
    pub fn set_http_server(
        &self,
        cfg: &config::Server,
        mut controllers: Vec<Box<dyn Controller>>,
    ) -> Result<Arc<HttpServer>, AppError> {
        controllers.push(Box::new(HealthController::new(
            cfg.health_path(),
            self.calculator.clone(),
        )));
        let server = HttpServer::new(cfg, controllers).map_err(AppError::HttpServer)?;
        self.set_server(server.clone());
        Ok(server)
    }

    pub fn health_calculator(&self) -> Option<Arc<dyn HealthCalculator>> {
        self.calculator.clone()
    }

    /// Returns the overall health and the JSON summary
    /// `[{"name":"..","status":".."}]`.
    pub fn health_check(&self) -> Result<(bool, Vec<u8>), AppError> {
        report(self.calculator.as_deref()).map_err(|err| {
            error!(
                component = "app",
                scope = "health",
                event = "encode_failed",
                error = %err,
                "error while encoding the health summary"
            );
            err.into()
        })
    }

    /// Handle that starts the shutdown sequence when fired.
    pub fn trigger(&self) -> Trigger {
        self.trigger.clone()
    }

    pub fn shutdown_reason(&self) -> Option<ShutdownReason> {
        self.trigger.reason()
    }

    pub fn state(&self) -> State {
        *self.state.lock()
    }

    /// Runs the service until a shutdown trigger fires, then shuts it down.
    ///
    /// Returns an error only when start-up fails; errors from running and
    /// stopping components are logged. Cancelling `ctx` shuts the app down
    /// the same way a signal does.
    pub async fn start(&self, ctx: CancellationToken) -> Result<(), AppError> {
        self.begin()?;

        let run_token = ctx.child_token();
        let components = self.components.lock().clone();
        let server = self.server.lock().clone();

        if let Err(err) = self.init(&components).await {
            self.set_state(State::Stopped);
            return Err(err);
        }

        let listeners = match signal::subscribe(&self.signals, self.trigger.clone()) {
            Ok(listeners) => listeners,
            Err(err) => {
                self.set_state(State::Stopped);
                return Err(err.into());
            }
        };

        self.set_state(State::Running);
        let mut tasks = self.spawn_components(&components, &run_token);

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        if let Some(server) = &server {
            tasks.push(("server".to_string(), self.spawn_server(server.clone())));
        }

        info!(
            component = "app",
            event = "started",
            components = components.len(),
            with_server = server.is_some(),
            "application lifecycle"
        );

        let reason = tokio::select! {
            reason = self.trigger.fired() => reason,
            _ = ctx.cancelled() => {
                self.trigger.fire(ShutdownReason::Cancelled);
                self.trigger.reason().unwrap_or(ShutdownReason::Cancelled)
            }
        };

        info!(
            component = "app",
            event = "shutdown_initiated",
            reason = %reason,
            timeout = %humantime::format_duration(self.graceful_timeout),
            "graceful shutdown initiated"
        );
        self.set_state(State::ShuttingDown);

        self.shutdown(run_token, server, &components, tasks).await;

        join_listeners(listeners).await;

        self.set_state(State::Stopped);
        info!(component = "app", event = "stopped", "shutdown finalized");

        Ok(())
    }

    fn begin(&self) -> Result<(), AppError> {
        let mut state = self.state.lock();
        if *state != State::Idle {
            return Err(AppError::AlreadyStarted(*state));
        }
        *state = State::Initializing;
        Ok(())
    }

    fn set_state(&self, next: State) {
        let mut state = self.state.lock();
        debug!(
            component = "app",
            event = "state_changed",
            from = state.as_str(),
            to = next.as_str(),
            "state changed"
        );
        *state = next;
    }

    fn warn_if_started(&self, op: &'static str) {
        let state = self.state();
        if state != State::Idle {
            warn!(
                component = "app",
                event = "late_registration",
                op,
                state = state.as_str(),
                "registration after start is not supported"
            );
        }
    }

    /// Sequential, stops at the first failure.
    async fn init(&self, components: &[Arc<dyn Component>]) -> Result<(), AppError> {
        for component in components {
            if let Err(source) = component.init().await {
                error!(
                    component = "app",
                    scope = "init",
                    event = "init_failed",
                    name = component.label(),
                    error = %source,
                    "unable to init component"
                );
                return Err(AppError::Init {
                    component: component.label().to_string(),
                    source,
                });
            }
        }
        Ok(())
    }

    fn spawn_components(
        &self,
        components: &[Arc<dyn Component>],
        token: &CancellationToken,
    ) -> Vec<(String, JoinHandle<()>)> {
        components
            .iter()
            .map(|component| {
                let label = component.label().to_string();
                let component = component.clone();
                let token = token.clone();
                let name = label.clone();
                let handle = tokio::task::spawn(async move {
                    if let Err(err) = component.run(token).await {
                        error!(
                            component = "app",
                            scope = "run",
                            event = "run_failed",
                            name = %name,
                            error = %err,
                            "unable to run component"
                        );
                    }
                });
                (label, handle)
            })
            .collect()
    }

    fn spawn_server(&self, server: Arc<dyn Server>) -> JoinHandle<()> {
        let trigger = self.trigger.clone();
        tokio::task::spawn(async move {
            info!(component = "app", scope = "server", event = "starting", "starting server");
            match server.listen_and_serve().await {
                Ok(()) => {
                    info!(component = "app", scope = "server", event = "finished", "server finished serving");
                }
                Err(err) => {
                    error!(
                        component = "app",
                        scope = "server",
                        event = "serve_failed",
                        severity = "fatal",
                        error = %err,
                        "unable to run the server"
                    );
                    trigger.fire(ShutdownReason::ServerFailure(format!("{err:#}")));
                }
            }
        })
    }

    /// Cancels runs, then stops the server and every component under one deadline.
    async fn shutdown(
        &self,
        run_token: CancellationToken,
        server: Option<Arc<dyn Server>>,
        components: &[Arc<dyn Component>],
        tasks: Vec<(String, JoinHandle<()>)>,
    ) {
        run_token.cancel();
        let deadline = Deadline::after(self.graceful_timeout);

        if let Some(server) = server {
            match deadline.run(server.shutdown(deadline)).await {
                Ok(Ok(())) => {
                    debug!(component = "app", scope = "server", event = "shutdown_success", "server stopped");
                }
                Ok(Err(err)) => {
                    error!(
                        component = "app",
                        scope = "server",
                        event = "shutdown_failed",
                        error = %err,
                        "error gracefully stopping server"
                    );
                }
                Err(err) => {
                    error!(
                        component = "app",
                        scope = "server",
                        event = "shutdown_timeout",
                        timeout = %humantime::format_duration(self.graceful_timeout),
                        error = %err,
                        "server did not stop in time"
                    );
                }
            }
        }

        for component in components {
            match deadline.run(component.stop(deadline)).await {
                Ok(Ok(())) => {
                    debug!(
                        component = "app",
                        scope = "stop",
                        event = "stop_success",
                        name = component.label(),
                        "component stopped"
                    );
                }
                Ok(Err(err)) => {
                    error!(
                        component = "app",
                        scope = "stop",
                        event = "stop_failed",
                        name = component.label(),
                        error = %err,
                        "error gracefully stopping component"
                    );
                }
                Err(err) => {
                    error!(
                        component = "app",
                        scope = "stop",
                        event = "stop_timeout",
                        name = component.label(),
                        error = %err,
                        "component did not stop in time"
                    );
                }
            }
        }

        for (name, task) in tasks {
            match deadline.run(task).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    error!(
                        component = "app",
                        scope = "run",
                        event = "task_panicked",
                        name = %name,
                        error = %err,
                        "task ended abnormally"
                    );
                }
                Err(_) => {
                    warn!(
                        component = "app",
                        scope = "run",
                        event = "task_detached",
                        name = %name,
                        "task still running after the deadline, leaving it behind"
                    );
                }
            }
        }
    }
}

/// Awaits the signal listeners, logging any that panicked. Returns how many failed.
pub(super) async fn join_listeners(listeners: Vec<JoinHandle<()>>) -> usize {
    let mut failed = 0;
    for listener in listeners {
        if let Err(err) = listener.await {
            failed += 1;
            error!(
                component = "app",
                scope = "signal",
                event = "listener_failed",
                error = %err,
                "signal listener ended abnormally"
            );
        }
    }
    failed
}
