use std::fmt;

/// Lifecycle of an [`App`](super::App). Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Initializing,
    Running,
    ShuttingDown,
    Stopped,
}

impl State {
    pub const fn as_str(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Initializing => "initializing",
            State::Running => "running",
            State::ShuttingDown => "shutting_down",
            State::Stopped => "stopped",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
